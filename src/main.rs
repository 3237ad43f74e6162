mod adapter;
mod cleanup;
mod cli;
mod config;
mod dispatch;

use adapter::{AdbCli, DeviceAdapter, ShellDeviceService};
use anyhow::{Context, Result};
use clap::Parser;
use cleanup::{CleanupOrchestrator, DeviceSession};
use cli::{Cli, Commands};
use config::AppConfig;
use reclaim_shared::cleanup::BOOT_POLL_INTERVAL_MS;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let config = config::load_config(cli.config.as_deref()).context("invalid configuration")?;

    match cli.command {
        Commands::Validate => validate(&config),
        Commands::Session {
            serial,
            release_on_eof,
        } => run_session(&config, serial, release_on_eof).await,
        Commands::Packages { serial } => list_packages(&config, &serial).await,
    }
}

fn device_adapter(config: &AppConfig) -> DeviceAdapter {
    DeviceAdapter::new(Arc::new(AdbCli::new(&config.adb)))
        .with_operation_timeout(config.cleanup.operation_timeout())
}

fn validate(config: &AppConfig) -> Result<()> {
    let cleanup = &config.cleanup;
    info!("Configuration is valid");
    info!("  cleanup enabled: {}", cleanup.cleanup_enabled);
    info!("  cleanup folders: {:?}", cleanup.cleanup_folders);
    info!("  disable Bluetooth: {}", cleanup.cleanup_disable_bluetooth);
    info!("  clear Bluetooth bonds: {}", cleanup.cleanup_bluetooth_bonds);
    info!("  concurrency: {}", cleanup.cleanup_concurrency);
    info!("  package manager: {:?}", config.adb.package_manager);
    Ok(())
}

async fn list_packages(config: &AppConfig, serial: &str) -> Result<()> {
    let packages = device_adapter(config)
        .list_packages(serial)
        .await
        .with_context(|| format!("unable to list packages on {serial}"))?;

    for package in packages.iter() {
        println!("{package}");
    }
    Ok(())
}

async fn run_session(config: &AppConfig, serial: String, release_on_eof: bool) -> Result<()> {
    let session = DeviceSession::new(serial.clone(), config.cleanup.clone())
        .context("invalid cleanup configuration")?;
    let adapter = device_adapter(config);
    info!(serial = %serial, backend = adapter.backend_name(), "Device attached");

    adapter
        .wait_for_boot_completion(
            &serial,
            Duration::from_millis(BOOT_POLL_INTERVAL_MS),
            config.cleanup.boot_complete_timeout(),
        )
        .await
        .with_context(|| format!("device {serial} did not become ready"))?;

    let service = Arc::new(ShellDeviceService::new(adapter.clone(), serial.clone()));
    let mut orchestrator = CleanupOrchestrator::new(session, adapter, service);
    orchestrator
        .capture_baseline()
        .await
        .with_context(|| format!("unable to start session on {serial}"))?;

    if release_on_eof {
        info!(serial = %serial, "Session active; Ctrl-C or end of input releases it");
    } else {
        info!(serial = %serial, "Session active; Ctrl-C releases it");
    }
    wait_for_release(release_on_eof).await;

    let report = orchestrator.release().await?;
    for (step, outcome) in &report.steps {
        info!(
            "  {}: {} attempted, {} failed",
            step, outcome.attempted, outcome.failed
        );
    }
    Ok(())
}

/// Resolve when the session user lets go of the device
async fn wait_for_release(release_on_eof: bool) {
    let input_closed = async {
        if release_on_eof {
            let mut stdin = tokio::io::stdin();
            let _ = tokio::io::copy(&mut stdin, &mut tokio::io::sink()).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Unable to listen for Ctrl-C: {}", e);
            }
            info!("Release signal received");
        }
        _ = input_closed => {
            info!("Input closed, releasing session");
        }
    }
}
