//! Device-service capabilities over the shell transport

use crate::adapter::device::DeviceAdapter;
use crate::adapter::traits::DeviceService;
use async_trait::async_trait;
use reclaim_shared::{cleanup::SERVICE_PACKAGE, output, DeviceError};

const BLUETOOTH_STATUS: &str = "settings get global bluetooth_on";

/// Broadcast handled by the platform service to forget all paired devices
const BOND_CLEANUP_ACTION: &str = "jp.co.cyberagent.stf.ACTION_CLEAN_BLUETOOTH_BONDS";

/// `Activity.RESULT_OK`; the service's receiver sets it once bonds are gone.
/// An unhandled broadcast completes with `result=0`.
const BROADCAST_RESULT_OK: i32 = -1;

/// [`DeviceService`] for one device, issuing shell commands through the adapter
pub struct ShellDeviceService {
    adapter: DeviceAdapter,
    serial: String,
}

impl ShellDeviceService {
    pub fn new(adapter: DeviceAdapter, serial: impl Into<String>) -> Self {
        Self {
            adapter,
            serial: serial.into(),
        }
    }

    fn bond_cleanup_command() -> String {
        format!("am broadcast -a {BOND_CLEANUP_ACTION} -p {SERVICE_PACKAGE}")
    }
}

#[async_trait]
impl DeviceService for ShellDeviceService {
    async fn bluetooth_enabled(&self) -> Result<bool, DeviceError> {
        let raw = self.adapter.execute_shell(&self.serial, BLUETOOTH_STATUS).await?;
        output::parse_flag(&raw).ok_or_else(|| DeviceError::UnexpectedOutput {
            serial: self.serial.clone(),
            command: BLUETOOTH_STATUS.into(),
            output: String::from_utf8_lossy(&raw).trim().to_string(),
        })
    }

    async fn set_bluetooth_enabled(&self, enabled: bool) -> Result<(), DeviceError> {
        let command = if enabled {
            "svc bluetooth enable"
        } else {
            "svc bluetooth disable"
        };
        self.adapter.execute_shell(&self.serial, command).await?;
        Ok(())
    }

    async fn clear_bluetooth_bonds(&self) -> Result<(), DeviceError> {
        let command = Self::bond_cleanup_command();
        let raw = self.adapter.execute_shell(&self.serial, &command).await?;
        if output::parse_broadcast_result(&raw) != Some(BROADCAST_RESULT_OK) {
            return Err(DeviceError::UnexpectedOutput {
                serial: self.serial.clone(),
                command,
                output: String::from_utf8_lossy(&raw).trim().to_string(),
            });
        }
        Ok(())
    }
}
