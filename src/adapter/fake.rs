//! Scripted in-memory device for tests

use crate::adapter::traits::{DeviceControl, DeviceService};
use async_trait::async_trait;
use bytes::Bytes;
use reclaim_shared::{DeviceError, DirEntry, PackageSet};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One recorded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPackages,
    Uninstall(String),
    Shell(String),
    ReadDir(String),
    BootProbe,
    BluetoothStatus,
    SetBluetooth(bool),
    ClearBonds,
}

#[derive(Default)]
pub struct FakeDevice {
    calls: Mutex<Vec<Call>>,
    packages: Mutex<PackageSet>,
    folders: Mutex<HashMap<String, Vec<String>>>,
    failing_uninstalls: Mutex<HashSet<String>>,
    failing_paths: Mutex<HashSet<String>>,
    uninstall_delay: Mutex<Option<Duration>>,
    offline: AtomicBool,
    hang_shell: AtomicBool,
    shell_replies: Mutex<HashMap<String, String>>,
    hanging_probes: AtomicU32,
    boot_after: Mutex<Option<u32>>,
    boot_polls: AtomicU32,
    bluetooth_on: AtomicBool,
    fail_bluetooth: AtomicBool,
    fail_bonds: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDevice {
    pub fn new() -> Self {
        let fake = Self::default();
        *fake.boot_after.lock().unwrap() = Some(1);
        fake
    }

    pub fn with_packages(packages: &[&str]) -> Self {
        let fake = Self::new();
        fake.set_packages(packages);
        fake
    }

    pub fn set_packages(&self, packages: &[&str]) {
        *self.packages.lock().unwrap() = packages.iter().copied().collect();
    }

    pub fn install(&self, package: &str) {
        self.packages.lock().unwrap().insert(package);
    }

    pub fn add_folder(&self, path: &str, names: &[&str]) {
        self.folders
            .lock()
            .unwrap()
            .insert(path.to_string(), names.iter().map(|n| n.to_string()).collect());
    }

    pub fn fail_uninstall(&self, package: &str) {
        self.failing_uninstalls.lock().unwrap().insert(package.to_string());
    }

    pub fn fail_remove(&self, path: &str) {
        self.failing_paths.lock().unwrap().insert(path.to_string());
    }

    pub fn slow_uninstalls(&self, delay: Duration) {
        *self.uninstall_delay.lock().unwrap() = Some(delay);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn hang_shell(&self) {
        self.hang_shell.store(true, Ordering::SeqCst);
    }

    /// Answer `command` with `output` instead of empty stdout
    pub fn reply_to(&self, command: &str, output: &str) {
        self.shell_replies
            .lock()
            .unwrap()
            .insert(command.to_string(), output.to_string());
    }

    /// The next `count` boot probes never answer
    pub fn hang_boot_probes(&self, count: u32) {
        self.hanging_probes.store(count, Ordering::SeqCst);
    }

    pub fn boot_after_polls(&self, polls: u32) {
        *self.boot_after.lock().unwrap() = Some(polls);
    }

    pub fn never_boot(&self) {
        *self.boot_after.lock().unwrap() = None;
    }

    pub fn boot_polls(&self) -> u32 {
        self.boot_polls.load(Ordering::SeqCst)
    }

    pub fn set_bluetooth(&self, enabled: bool) {
        self.bluetooth_on.store(enabled, Ordering::SeqCst);
    }

    pub fn bluetooth_on(&self) -> bool {
        self.bluetooth_on.load(Ordering::SeqCst)
    }

    pub fn fail_bluetooth(&self) {
        self.fail_bluetooth.store(true, Ordering::SeqCst);
    }

    pub fn fail_bonds(&self) {
        self.fail_bonds.store(true, Ordering::SeqCst);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uninstalled(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Uninstall(pkg) => Some(pkg),
                _ => None,
            })
            .collect()
    }

    /// Paths targeted by `rm -rf`, unquoted
    pub fn removed_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Shell(cmd) => cmd
                    .strip_prefix("rm -rf ")
                    .map(|path| path.trim_matches('"').to_string()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_online(&self, serial: &str) -> Result<(), DeviceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DeviceError::transport(serial, "device offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceControl for FakeDevice {
    async fn list_packages(&self, serial: &str) -> Result<PackageSet, DeviceError> {
        self.record(Call::ListPackages);
        self.check_online(serial)?;
        Ok(self.packages.lock().unwrap().clone())
    }

    async fn uninstall(&self, serial: &str, package: &str) -> Result<bool, DeviceError> {
        self.record(Call::Uninstall(package.to_string()));
        self.check_online(serial)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.uninstall_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_uninstalls.lock().unwrap().contains(package) {
            return Err(DeviceError::transport(serial, "closed"));
        }
        let mut packages = self.packages.lock().unwrap();
        let removed: PackageSet = packages.iter().filter(|p| *p != package).collect();
        let existed = removed.len() != packages.len();
        *packages = removed;
        Ok(existed)
    }

    async fn shell(&self, serial: &str, command: &str) -> Result<Bytes, DeviceError> {
        self.record(Call::Shell(command.to_string()));
        self.check_online(serial)?;
        if self.hang_shell.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let reply = self.shell_replies.lock().unwrap().get(command).cloned();
        if let Some(reply) = reply {
            return Ok(Bytes::from(reply));
        }

        if let Some(path) = command.strip_prefix("rm -rf ") {
            let path = path.trim_matches('"');
            if self.failing_paths.lock().unwrap().contains(path) {
                return Err(DeviceError::transport(serial, "rm: Permission denied"));
            }
            return Ok(Bytes::new());
        }
        if let Some(path) = command.strip_prefix("du -h ") {
            return Ok(Bytes::from(format!("4.0K\t{}\n", path.trim_matches('"'))));
        }
        Ok(Bytes::new())
    }

    async fn read_dir(&self, serial: &str, path: &str) -> Result<Vec<DirEntry>, DeviceError> {
        self.record(Call::ReadDir(path.to_string()));
        self.check_online(serial)?;

        let folders = self.folders.lock().unwrap();
        let names = folders
            .get(path)
            .ok_or_else(|| DeviceError::transport(serial, format!("ls: {path}: No such file or directory")))?;
        let mut entries = vec![DirEntry::dir("."), DirEntry::dir("..")];
        entries.extend(names.iter().map(|name| DirEntry::file(name.as_str())));
        Ok(entries)
    }

    async fn is_boot_completed(&self, serial: &str) -> Result<bool, DeviceError> {
        self.record(Call::BootProbe);
        self.check_online(serial)?;
        let hanging = self
            .hanging_probes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if hanging.is_ok() {
            std::future::pending::<()>().await;
        }
        let polls = self.boot_polls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(matches!(*self.boot_after.lock().unwrap(), Some(after) if polls >= after))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[async_trait]
impl DeviceService for FakeDevice {
    async fn bluetooth_enabled(&self) -> Result<bool, DeviceError> {
        self.record(Call::BluetoothStatus);
        self.check_online("fake")?;
        if self.fail_bluetooth.load(Ordering::SeqCst) {
            return Err(DeviceError::transport("fake", "service unavailable"));
        }
        Ok(self.bluetooth_on())
    }

    async fn set_bluetooth_enabled(&self, enabled: bool) -> Result<(), DeviceError> {
        self.record(Call::SetBluetooth(enabled));
        self.check_online("fake")?;
        if self.fail_bluetooth.load(Ordering::SeqCst) {
            return Err(DeviceError::transport("fake", "service unavailable"));
        }
        self.set_bluetooth(enabled);
        Ok(())
    }

    async fn clear_bluetooth_bonds(&self) -> Result<(), DeviceError> {
        self.record(Call::ClearBonds);
        self.check_online("fake")?;
        if self.fail_bonds.load(Ordering::SeqCst) {
            return Err(DeviceError::transport("fake", "bond clearing failed"));
        }
        Ok(())
    }
}
