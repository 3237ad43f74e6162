//! Cleanup step implementations
//!
//! Each step logs and swallows its own failures and reports counts through
//! [`StepOutcome`]. None of them returns an error.

use super::plan::StepOutcome;
use crate::adapter::{DeviceAdapter, DeviceService};
use crate::config::CleanupConfig;
use crate::dispatch::fan_out;
use reclaim_shared::output::{parse_du_size, shell_quote};
use reclaim_shared::{join_remote, safety, PackageSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a step needs to reach the device
#[derive(Clone)]
pub struct StepContext {
    pub serial: String,
    pub adapter: DeviceAdapter,
    pub service: Arc<dyn DeviceService>,
    pub config: Arc<CleanupConfig>,
}

/// Uninstall every package present now that was not in `baseline`
pub async fn remove_packages(ctx: &StepContext, baseline: &PackageSet) -> StepOutcome {
    let current = match ctx.adapter.list_packages(&ctx.serial).await {
        Ok(current) => current,
        Err(e) => {
            warn!(serial = %ctx.serial, "Unable to list packages: {}", e);
            return StepOutcome { attempted: 1, failed: 1 };
        }
    };

    let stale = current.difference(baseline);
    if stale.is_empty() {
        debug!(serial = %ctx.serial, "No packages to clean up");
        return StepOutcome::default();
    }

    let adapter = ctx.adapter.clone();
    let serial = ctx.serial.clone();
    let results = fan_out(ctx.config.concurrency(), stale, move |package: String| {
        let adapter = adapter.clone();
        let serial = serial.clone();
        async move { uninstall_package(&adapter, &serial, &package).await }
    })
    .await;

    StepOutcome::from_results(&results)
}

async fn uninstall_package(adapter: &DeviceAdapter, serial: &str, package: &str) -> bool {
    info!(serial, package, "Cleaning up package");
    match adapter.uninstall(serial, package).await {
        Ok(true) => true,
        Ok(false) => {
            warn!(serial, package, "Package was not uninstalled");
            false
        }
        Err(e) => {
            warn!(serial, package, "Unable to clean up package: {}", e);
            false
        }
    }
}

/// Ask the device service to forget all paired Bluetooth devices
pub async fn clean_bluetooth_bonds(ctx: &StepContext) -> StepOutcome {
    info!(serial = %ctx.serial, "Cleanup Bluetooth bonds");
    let mut outcome = StepOutcome::default();
    match ctx.service.clear_bluetooth_bonds().await {
        Ok(()) => outcome.record(true),
        Err(e) => {
            warn!(serial = %ctx.serial, "Unable to clean Bluetooth bonds: {}", e);
            outcome.record(false);
        }
    }
    outcome
}

/// Turn Bluetooth off, only if it is currently on
pub async fn disable_bluetooth(ctx: &StepContext) -> StepOutcome {
    let mut outcome = StepOutcome::default();

    let enabled = match ctx.service.bluetooth_enabled().await {
        Ok(enabled) => enabled,
        Err(e) => {
            warn!(serial = %ctx.serial, "Unable to read Bluetooth status: {}", e);
            outcome.record(false);
            return outcome;
        }
    };

    if !enabled {
        debug!(serial = %ctx.serial, "Bluetooth already disabled");
        return outcome;
    }

    info!(serial = %ctx.serial, "Disabling Bluetooth");
    match ctx.service.set_bluetooth_enabled(false).await {
        Ok(()) => outcome.record(true),
        Err(e) => {
            warn!(serial = %ctx.serial, "Unable to disable Bluetooth: {}", e);
            outcome.record(false);
        }
    }
    outcome
}

/// Purge the immediate entries of every configured folder
pub async fn clean_folders(ctx: &StepContext) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    for folder in &ctx.config.cleanup_folders {
        outcome.merge(clean_folder(ctx, folder).await);
    }
    outcome
}

async fn clean_folder(ctx: &StepContext, folder: &str) -> StepOutcome {
    // Validated at session construction; refuse anyway rather than rm under /system
    if let Some(protected) = safety::protected_prefix(folder) {
        warn!(serial = %ctx.serial, folder, protected, "Refusing to clean protected folder");
        return StepOutcome { attempted: 1, failed: 1 };
    }

    let entries = match ctx.adapter.list_directory(&ctx.serial, folder).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(serial = %ctx.serial, folder, "Unable to list folder: {}", e);
            return StepOutcome { attempted: 1, failed: 1 };
        }
    };

    let targets: Vec<String> = entries
        .into_iter()
        .map(|entry| join_remote(folder, &entry.name))
        .filter(|path| {
            let exempt = safety::is_service_file(path);
            if exempt {
                debug!(path = %path, "Skipping service file");
            }
            !exempt
        })
        .collect();

    if targets.is_empty() {
        debug!(serial = %ctx.serial, folder, "Folder already clean");
        return StepOutcome::default();
    }

    let adapter = ctx.adapter.clone();
    let serial = ctx.serial.clone();
    let results = fan_out(ctx.config.concurrency(), targets, move |path: String| {
        let adapter = adapter.clone();
        let serial = serial.clone();
        async move { remove_path(&adapter, &serial, &path).await }
    })
    .await;

    StepOutcome::from_results(&results)
}

async fn remove_path(adapter: &DeviceAdapter, serial: &str, path: &str) -> bool {
    let quoted = shell_quote(path);

    // Size is informational only
    let size = match adapter.execute_shell(serial, &format!("du -h {quoted}")).await {
        Ok(raw) => parse_du_size(&raw).unwrap_or_else(|| "?".into()),
        Err(_) => "?".into(),
    };
    info!(serial, path, size = %size, "Removing file");

    match adapter.execute_shell(serial, &format!("rm -rf {quoted}")).await {
        Ok(_) => true,
        Err(e) => {
            warn!(serial, path, "Unable to remove file: {}", e);
            false
        }
    }
}
