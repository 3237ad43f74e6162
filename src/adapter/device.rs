//! Version-agnostic device adapter
//!
//! Wraps exactly one [`DeviceControl`] backend chosen at construction.
//! Listings never contain `.` or `..`. Remote calls may be bounded by an
//! optional per-operation deadline.

use crate::adapter::traits::DeviceControl;
use bytes::Bytes;
use reclaim_shared::{DeviceError, DirEntry, PackageSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

/// Stable device-control surface used by the cleanup pipeline
#[derive(Clone)]
pub struct DeviceAdapter {
    backend: Arc<dyn DeviceControl>,
    operation_timeout: Option<Duration>,
}

impl DeviceAdapter {
    /// Create an adapter over `backend` with no per-operation deadline
    pub fn new(backend: Arc<dyn DeviceControl>) -> Self {
        Self {
            backend,
            operation_timeout: None,
        }
    }

    /// Bound every remote call by `limit`. An elapsed call is a transport error.
    pub fn with_operation_timeout(mut self, limit: Option<Duration>) -> Self {
        self.operation_timeout = limit;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    async fn bounded<T, F>(&self, serial: &str, what: &str, call: F) -> Result<T, DeviceError>
    where
        F: Future<Output = Result<T, DeviceError>>,
    {
        match self.operation_timeout {
            None => call.await,
            Some(limit) => timeout(limit, call).await.unwrap_or_else(|_| {
                Err(DeviceError::transport(
                    serial,
                    format!("{what} timed out after {}ms", limit.as_millis()),
                ))
            }),
        }
    }

    pub async fn list_packages(&self, serial: &str) -> Result<PackageSet, DeviceError> {
        self.bounded(serial, "list packages", self.backend.list_packages(serial))
            .await
    }

    pub async fn uninstall(&self, serial: &str, package: &str) -> Result<bool, DeviceError> {
        self.bounded(serial, "uninstall", self.backend.uninstall(serial, package))
            .await
    }

    /// Blocking shell round trip, no retry
    pub async fn execute_shell(&self, serial: &str, command: &str) -> Result<Bytes, DeviceError> {
        self.bounded(serial, "shell", self.backend.shell(serial, command))
            .await
    }

    /// Directory entries in backend order, without `.` and `..`
    pub async fn list_directory(&self, serial: &str, path: &str) -> Result<Vec<DirEntry>, DeviceError> {
        let entries = self
            .bounded(serial, "list directory", self.backend.read_dir(serial, path))
            .await?;
        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_self_or_parent())
            .collect())
    }

    /// Poll boot state every `poll_interval` until ready.
    ///
    /// Logs a progress line on every poll that is not yet ready. A probe that
    /// outlives the per-operation deadline counts as not ready. Fails with
    /// [`DeviceError::Timeout`] once `deadline` elapses; transport failures
    /// while polling are returned as-is.
    pub async fn wait_for_boot_completion(
        &self,
        serial: &str,
        poll_interval: Duration,
        deadline: Duration,
    ) -> Result<(), DeviceError> {
        let started = Instant::now();

        let poll = async {
            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                let probe = self.backend.is_boot_completed(serial);
                let ready = match self.operation_timeout {
                    None => probe.await?,
                    Some(limit) => match timeout(limit, probe).await {
                        Ok(ready) => ready?,
                        Err(_) => {
                            debug!(serial, attempt, "Boot probe timed out");
                            false
                        }
                    },
                };
                if ready {
                    debug!(serial, attempt, "Boot completed");
                    return Ok(());
                }
                info!(serial, attempt, "Waiting for boot to complete");
                sleep(poll_interval).await;
            }
        };

        match timeout(deadline, poll).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Timeout {
                serial: serial.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::fake::FakeDevice;

    fn adapter(fake: &Arc<FakeDevice>) -> DeviceAdapter {
        DeviceAdapter::new(fake.clone())
    }

    #[tokio::test]
    async fn test_listing_excludes_self_and_parent() {
        let fake = Arc::new(FakeDevice::new());
        fake.add_folder("/data/local/tmp", &["minicap", "junk.log"]);

        let entries = adapter(&fake)
            .list_directory("serial", "/data/local/tmp")
            .await
            .unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["minicap", "junk.log"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_wait_succeeds_before_deadline() {
        let fake = Arc::new(FakeDevice::new());
        fake.boot_after_polls(3);

        let result = adapter(&fake)
            .wait_for_boot_completion("serial", Duration::from_millis(1000), Duration::from_secs(10))
            .await;
        assert!(result.is_ok());
        assert_eq!(fake.boot_polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_wait_times_out() {
        let fake = Arc::new(FakeDevice::new());
        fake.never_boot();

        let err = adapter(&fake)
            .wait_for_boot_completion("serial", Duration::from_millis(1000), Duration::from_millis(5000))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(fake.boot_polls() >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_wait_propagates_transport_error() {
        let fake = Arc::new(FakeDevice::new());
        fake.go_offline();

        let err = adapter(&fake)
            .wait_for_boot_completion("serial", Duration::from_millis(1000), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Transport { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_boot_probe_keeps_polling() {
        let fake = Arc::new(FakeDevice::new());
        fake.hang_boot_probes(2);

        adapter(&fake)
            .with_operation_timeout(Some(Duration::from_millis(200)))
            .wait_for_boot_completion("serial", Duration::from_millis(1000), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(fake.boot_polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_boot_probes_end_in_boot_timeout() {
        let fake = Arc::new(FakeDevice::new());
        fake.hang_boot_probes(u32::MAX);

        let err = adapter(&fake)
            .with_operation_timeout(Some(Duration::from_millis(200)))
            .wait_for_boot_completion("serial", Duration::from_millis(1000), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_timeout_is_transport_error() {
        let fake = Arc::new(FakeDevice::new());
        fake.hang_shell();

        let err = adapter(&fake)
            .with_operation_timeout(Some(Duration::from_millis(200)))
            .execute_shell("serial", "rm -rf \"/data/local/tmp/x\"")
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Transport { .. }));
        assert!(!err.is_timeout());
    }
}
