//! `adb` command-line transport

use crate::adapter::traits::DeviceControl;
use crate::config::{AdbConfig, PackageManager};
use async_trait::async_trait;
use bytes::Bytes;
use reclaim_shared::output::{self, shell_quote};
use reclaim_shared::{DeviceError, DirEntry, PackageSet};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::trace;

/// Captured result of one `adb shell` round trip
#[derive(Debug)]
struct ShellOutput {
    success: bool,
    stdout: Bytes,
    stderr: String,
}

/// Device control through the `adb` binary.
///
/// Every call is one `adb -s <serial> shell <command>` process.
pub struct AdbCli {
    program: PathBuf,
    server_args: Vec<String>,
    package_manager: PackageManager,
}

impl AdbCli {
    /// Create a new adb transport from configuration
    pub fn new(config: &AdbConfig) -> Self {
        let mut server_args = Vec::new();
        if let Some(host) = &config.adb_host {
            server_args.push("-H".to_string());
            server_args.push(host.clone());
        }
        if let Some(port) = config.adb_port {
            server_args.push("-P".to_string());
            server_args.push(port.to_string());
        }

        Self {
            program: config.adb_path.clone(),
            server_args,
            package_manager: config.package_manager,
        }
    }

    /// Full argument vector for running `command` on `serial`
    fn args(&self, serial: &str, command: &str) -> Vec<String> {
        let mut args = self.server_args.clone();
        args.extend([
            "-s".to_string(),
            serial.to_string(),
            "shell".to_string(),
            command.to_string(),
        ]);
        args
    }

    fn list_packages_command(&self) -> &'static str {
        match self.package_manager {
            PackageManager::Pm => "pm list packages",
            PackageManager::Cmd => "cmd package list packages",
        }
    }

    fn uninstall_command(&self, package: &str) -> String {
        match self.package_manager {
            PackageManager::Pm => format!("pm uninstall {}", shell_quote(package)),
            PackageManager::Cmd => format!("cmd package uninstall {}", shell_quote(package)),
        }
    }

    async fn run(&self, serial: &str, command: &str) -> Result<ShellOutput, DeviceError> {
        trace!(serial, command, "adb shell");

        let out = Command::new(&self.program)
            .args(self.args(serial, command))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DeviceError::transport(serial, format!("failed to run {}: {e}", self.program.display()))
            })?;

        let output = ShellOutput {
            success: out.status.success(),
            stdout: Bytes::from(out.stdout),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        };

        // adb itself failing (device offline, server down) leaves stdout empty
        if !output.success && output.stdout.is_empty() {
            let message = if output.stderr.is_empty() {
                format!("`{command}` exited with {}", out.status)
            } else {
                output.stderr
            };
            return Err(DeviceError::transport(serial, message));
        }

        Ok(output)
    }

    async fn run_checked(&self, serial: &str, command: &str) -> Result<Bytes, DeviceError> {
        let output = self.run(serial, command).await?;
        if !output.success {
            return Err(DeviceError::transport(
                serial,
                format!(
                    "`{command}` failed: {}",
                    if output.stderr.is_empty() {
                        String::from_utf8_lossy(&output.stdout).trim().to_string()
                    } else {
                        output.stderr
                    }
                ),
            ));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl DeviceControl for AdbCli {
    async fn list_packages(&self, serial: &str) -> Result<PackageSet, DeviceError> {
        let raw = self.run_checked(serial, self.list_packages_command()).await?;
        Ok(output::parse_packages(&raw))
    }

    async fn uninstall(&self, serial: &str, package: &str) -> Result<bool, DeviceError> {
        // A refused uninstall exits non-zero but still prints `Failure [...]`
        let output = self.run(serial, &self.uninstall_command(package)).await?;
        Ok(output::parse_uninstall(&output.stdout))
    }

    async fn shell(&self, serial: &str, command: &str) -> Result<Bytes, DeviceError> {
        self.run_checked(serial, command).await
    }

    async fn read_dir(&self, serial: &str, path: &str) -> Result<Vec<DirEntry>, DeviceError> {
        let raw = self
            .run_checked(serial, &format!("ls -1ap {}", shell_quote(path)))
            .await?;
        Ok(output::parse_dir_listing(&raw))
    }

    async fn is_boot_completed(&self, serial: &str) -> Result<bool, DeviceError> {
        let raw = self.run_checked(serial, "getprop sys.boot_completed").await?;
        Ok(output::parse_flag(&raw) == Some(true))
    }

    fn name(&self) -> &'static str {
        match self.package_manager {
            PackageManager::Pm => "adb (pm)",
            PackageManager::Cmd => "adb (cmd package)",
        }
    }
}
