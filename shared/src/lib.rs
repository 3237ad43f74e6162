//! Device Reclaim Shared Types
//!
//! This crate provides the constants, package-set model, safety checks and
//! session state machine shared by the reclamation daemon and its tooling.

pub mod error;
pub mod output;
pub mod safety;
pub mod state_machine;

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

pub use error::{ConfigError, DeviceError, StateError};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Fixed parameters of the cleanup pipeline
pub mod cleanup {
    /// Filesystem prefixes a cleanup folder must never equal or start with
    pub const PROTECTED_PATHS: [&str; 6] = ["/system", "/boot", "/proc", "/vendor", "/dev", "/sys"];

    /// Package id of the platform's own on-device service.
    /// Always merged into the baseline so it is never uninstalled.
    pub const SERVICE_PACKAGE: &str = "jp.co.cyberagent.stf";

    /// Service-owned binaries pushed to the device; exempt from folder cleanup
    pub const SERVICE_FILES: [&str; 5] = [
        "/data/local/tmp/minicap",
        "/data/local/tmp/minicap.so",
        "/data/local/tmp/minitouch",
        "/data/local/tmp/minirev",
        "/data/local/tmp/stf-agent.apk",
    ];

    /// Interval between boot-completion polls
    pub const BOOT_POLL_INTERVAL_MS: u64 = 1000;

    /// Default overall boot-completion deadline
    pub const DEFAULT_BOOT_COMPLETE_TIMEOUT_MS: u64 = 60_000;

    /// Default cap on concurrent remote operations within one cleanup step
    pub const DEFAULT_CONCURRENCY: usize = 4;
}

/// An unordered set of package identifiers read from a device.
///
/// Backed by a `BTreeSet` so iteration (and therefore uninstall submission
/// order and log output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet(BTreeSet<String>);

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: impl Into<String>) -> bool {
        self.0.insert(package.into())
    }

    pub fn contains(&self, package: &str) -> bool {
        self.0.contains(package)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Packages present in `self` but not in `baseline`, in sorted order
    pub fn difference(&self, baseline: &PackageSet) -> Vec<String> {
        self.0.difference(&baseline.0).cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PackageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    /// True for the `.` and `..` pseudo-entries
    pub fn is_self_or_parent(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Join a remote folder and an entry name with exactly one separator
pub fn join_remote(folder: &str, name: &str) -> String {
    format!("{}/{}", folder.trim_end_matches('/'), name)
}
