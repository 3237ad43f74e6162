//! Folder Safety Validator
//!
//! Rejects cleanup folders that equal, or sit under, a protected system path.
//! The test is a plain string prefix match, so `/systemx` is rejected along
//! with `/system/app`. Over-blocking is accepted; under-blocking is not.

use crate::cleanup::PROTECTED_PATHS;
use crate::error::ConfigError;

/// Return the protected prefix that `path` starts with, if any
pub fn protected_prefix(path: &str) -> Option<&'static str> {
    PROTECTED_PATHS
        .iter()
        .copied()
        .find(|protected| path.starts_with(protected))
}

/// Validate every configured cleanup folder, failing on the first violation
pub fn validate_cleanup_folders<S: AsRef<str>>(paths: &[S]) -> Result<(), ConfigError> {
    for path in paths {
        let path = path.as_ref();
        if let Some(protected) = protected_prefix(path) {
            return Err(ConfigError::ProtectedPath {
                path: path.to_string(),
                protected,
            });
        }
    }
    Ok(())
}

/// True if `path` is one of the service-owned files exempt from folder cleanup
pub fn is_service_file(path: &str) -> bool {
    crate::cleanup::SERVICE_FILES.contains(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_paths_rejected() {
        for path in ["/system", "/system/app", "/boot/log", "/proc/1", "/vendor", "/dev/null", "/sys/kernel"] {
            assert!(
                validate_cleanup_folders(&[path]).is_err(),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_prefix_match_is_not_boundary_aware() {
        let err = validate_cleanup_folders(&["/systemx"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ProtectedPath {
                path: "/systemx".into(),
                protected: "/system",
            }
        );
        assert!(validate_cleanup_folders(&["/device"]).is_err());
    }

    #[test]
    fn test_safe_paths_accepted() {
        assert!(validate_cleanup_folders(&["/data/local/tmp", "/sdcard/Download"]).is_ok());
        assert!(validate_cleanup_folders::<&str>(&[]).is_ok());
    }

    #[test]
    fn test_first_violation_reported() {
        let err = validate_cleanup_folders(&["/data/local/tmp", "/boot/log", "/proc"]).unwrap_err();
        assert!(matches!(err, ConfigError::ProtectedPath { protected: "/boot", .. }));
    }

    #[test]
    fn test_service_files() {
        assert!(is_service_file("/data/local/tmp/minicap"));
        assert!(!is_service_file("/data/local/tmp/junk.log"));
    }
}
