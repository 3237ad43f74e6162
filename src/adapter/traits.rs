//! Capability traits for device backends

use async_trait::async_trait;
use bytes::Bytes;
use reclaim_shared::{DeviceError, DirEntry, PackageSet};

/// Remote control surface of a device transport.
///
/// Implementations forward calls and report transport failures; they do not
/// retry, filter, or interpret results beyond decoding them.
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// List installed package identifiers
    async fn list_packages(&self, serial: &str) -> Result<PackageSet, DeviceError>;

    /// Uninstall a package. `Ok(false)` means the device refused, including
    /// when the package is not installed.
    async fn uninstall(&self, serial: &str, package: &str) -> Result<bool, DeviceError>;

    /// Run a shell command and return its raw stdout
    async fn shell(&self, serial: &str, command: &str) -> Result<Bytes, DeviceError>;

    /// List a directory. May include the `.` and `..` pseudo-entries.
    async fn read_dir(&self, serial: &str, path: &str) -> Result<Vec<DirEntry>, DeviceError>;

    /// Single boot-state probe
    async fn is_boot_completed(&self, serial: &str) -> Result<bool, DeviceError>;

    /// Human-readable name for this backend
    fn name(&self) -> &'static str;
}

/// Capabilities provided by the platform's on-device service
#[async_trait]
pub trait DeviceService: Send + Sync {
    async fn bluetooth_enabled(&self) -> Result<bool, DeviceError>;

    async fn set_bluetooth_enabled(&self, enabled: bool) -> Result<(), DeviceError>;

    async fn clear_bluetooth_bonds(&self) -> Result<(), DeviceError>;
}
