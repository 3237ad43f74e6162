//! Configuration loading
//!
//! Configuration lives in a TOML file with a `[cleanup]` and an `[adb]`
//! table. Every key is optional. Cleanup folders are checked against the
//! protected system paths while loading, so a bad folder stops the process
//! before any device is touched.

use reclaim_shared::{cleanup, safety, ConfigError};
use serde::Deserialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-device cleanup policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CleanupConfig {
    /// Master switch; when off no baseline is taken and release does nothing
    pub cleanup_enabled: bool,
    /// Absolute folders whose immediate entries are removed on release
    pub cleanup_folders: Vec<String>,
    /// Turn Bluetooth off on release if it is on
    pub cleanup_disable_bluetooth: bool,
    /// Forget paired Bluetooth devices on release
    pub cleanup_bluetooth_bonds: bool,
    pub boot_complete_timeout_ms: u64,
    /// Concurrent remote operations within one cleanup step
    pub cleanup_concurrency: usize,
    /// Deadline for any single remote call. Unset means wait forever.
    pub operation_timeout_ms: Option<u64>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_enabled: false,
            cleanup_folders: Vec::new(),
            cleanup_disable_bluetooth: false,
            cleanup_bluetooth_bonds: false,
            boot_complete_timeout_ms: cleanup::DEFAULT_BOOT_COMPLETE_TIMEOUT_MS,
            cleanup_concurrency: cleanup::DEFAULT_CONCURRENCY,
            operation_timeout_ms: None,
        }
    }
}

impl CleanupConfig {
    /// Check folders and limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(relative) = self.cleanup_folders.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::NotAbsolute(relative.clone()));
        }
        safety::validate_cleanup_folders(&self.cleanup_folders)?;

        if self.cleanup_concurrency == 0 {
            return Err(ConfigError::Invalid("cleanupConcurrency must be at least 1".into()));
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("operationTimeoutMs must be positive".into()));
        }
        Ok(())
    }

    pub fn folder_cleanup_enabled(&self) -> bool {
        !self.cleanup_folders.is_empty()
    }

    pub fn boot_complete_timeout(&self) -> Duration {
        Duration::from_millis(self.boot_complete_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cleanup_concurrency).unwrap_or(NonZeroUsize::MIN)
    }
}

/// Package-manager command generation spoken to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// `pm list packages` / `pm uninstall`
    #[default]
    Pm,
    /// `cmd package list packages` / `cmd package uninstall`
    Cmd,
}

/// How to reach the adb server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AdbConfig {
    pub adb_path: PathBuf,
    pub adb_host: Option<String>,
    pub adb_port: Option<u16>,
    pub package_manager: PackageManager,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            adb_host: None,
            adb_port: None,
            package_manager: PackageManager::default(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub cleanup: CleanupConfig,
    pub adb: AdbConfig,
}

impl AppConfig {
    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| ConfigError::Invalid(format!("failed to parse config: {e}")))?;
        config.cleanup.validate()?;
        Ok(config)
    }
}

/// Load configuration from a specific file.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("failed to read config file {}: {e}", path.display()))
    })?;
    let config = AppConfig::from_toml_str(&content)?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Load from `path` if given, else use validated defaults
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config_from_file(path),
        None => Ok(AppConfig::default()),
    }
}
