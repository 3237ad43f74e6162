//! Device Control Adapter
//!
//! One stable call surface over the device transport:
//! - `DeviceControl` / `DeviceService` capability traits
//! - `AdbCli`, the `adb` binary backend, speaking either package-manager
//!   command generation (`pm` or `cmd package`)
//! - `DeviceAdapter`, the normalizing front used by the cleanup pipeline

mod adb;
mod device;
mod service;
mod traits;

#[cfg(test)]
pub mod fake;

pub use adb::AdbCli;
pub use device::DeviceAdapter;
pub use service::ShellDeviceService;
pub use traits::DeviceService;
