//! Device session identity and configuration

use crate::config::CleanupConfig;
use reclaim_shared::ConfigError;
use std::sync::Arc;

/// A device attached to the platform together with its cleanup policy.
///
/// The configuration is validated on construction and immutable afterwards,
/// so holding a `DeviceSession` means its cleanup folders are safe.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    serial: String,
    config: Arc<CleanupConfig>,
}

impl DeviceSession {
    pub fn new(serial: impl Into<String>, config: CleanupConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            serial: serial.into(),
            config: Arc::new(config),
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn config(&self) -> &Arc<CleanupConfig> {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_folder_rejects_session() {
        let config = CleanupConfig {
            cleanup_enabled: true,
            cleanup_folders: vec!["/boot/log".into()],
            ..Default::default()
        };
        let err = DeviceSession::new("emulator-5554", config).unwrap_err();
        assert!(matches!(err, ConfigError::ProtectedPath { .. }));
    }

    #[test]
    fn test_valid_session() {
        let config = CleanupConfig {
            cleanup_enabled: true,
            cleanup_folders: vec!["/data/local/tmp".into()],
            ..Default::default()
        };
        let session = DeviceSession::new("emulator-5554", config).unwrap();
        assert_eq!(session.serial(), "emulator-5554");
        assert!(session.config().folder_cleanup_enabled());
    }
}
