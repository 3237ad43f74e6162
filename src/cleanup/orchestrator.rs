//! Device Cleanup Orchestrator
//!
//! Owns one device session's cleanup lifecycle. The surrounding platform
//! calls [`CleanupOrchestrator::capture_baseline`] once when the session
//! starts and [`CleanupOrchestrator::release`] once when it ends. Release
//! runs a fixed sequence of steps:
//!
//! 1. remove packages installed during the session
//! 2. clear Bluetooth bonds (if configured)
//! 3. disable Bluetooth (if configured)
//! 4. purge cleanup folders (if configured)
//! 5. completion marker
//!
//! Bonds are cleared before the radio is turned off; some devices cannot
//! forget pairings with Bluetooth disabled. A device whose cleanup partly
//! failed is still returned to the pool; failures only show up in the logs
//! and in the returned [`CleanupReport`].

use super::plan::{CleanupPlan, CleanupReport, StepOutcome};
use super::session::DeviceSession;
use super::steps::{self, StepContext};
use crate::adapter::{DeviceAdapter, DeviceService};
use reclaim_shared::cleanup::SERVICE_PACKAGE;
use reclaim_shared::state_machine::{CleanupState, CleanupStateMachine, SessionEvent};
use reclaim_shared::{DeviceError, PackageSet, StateError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a lifecycle call was refused
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Cleanup lifecycle for one device session
pub struct CleanupOrchestrator {
    session: DeviceSession,
    ctx: StepContext,
    fsm: CleanupStateMachine,
    baseline: Option<PackageSet>,
}

impl CleanupOrchestrator {
    /// Create a new orchestrator in `Idle` state
    pub fn new(session: DeviceSession, adapter: DeviceAdapter, service: Arc<dyn DeviceService>) -> Self {
        let ctx = StepContext {
            serial: session.serial().to_string(),
            adapter,
            service,
            config: session.config().clone(),
        };

        Self {
            session,
            ctx,
            fsm: CleanupStateMachine::new(),
            baseline: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> CleanupState {
        self.fsm.state()
    }

    /// Baseline package set, once captured
    #[cfg(test)]
    pub fn baseline(&self) -> Option<&PackageSet> {
        self.baseline.as_ref()
    }

    fn enabled(&self) -> bool {
        self.session.config().cleanup_enabled
    }

    /// Record the packages present at session start, plus the platform's own
    /// service package. Fails if the device cannot be reached; the session
    /// must not start in that case.
    pub async fn capture_baseline(&mut self) -> Result<(), OrchestratorError> {
        if !self.enabled() {
            debug!(serial = %self.ctx.serial, "Cleanup disabled, no baseline taken");
            return Ok(());
        }
        if self.fsm.state() != CleanupState::Idle {
            return Err(StateError {
                from: self.fsm.state(),
                event: SessionEvent::BaselineCaptured,
            }
            .into());
        }

        let mut baseline = self.ctx.adapter.list_packages(&self.ctx.serial).await?;
        baseline.insert(SERVICE_PACKAGE);

        info!(
            serial = %self.ctx.serial,
            packages = baseline.len(),
            "Baseline package set captured"
        );
        self.baseline = Some(baseline);
        self.fsm
            .process_event(SessionEvent::BaselineCaptured)
            .into_result()?;
        Ok(())
    }

    /// Consume the release signal and run the cleanup plan to completion.
    ///
    /// Valid exactly once, after the baseline was captured. Individual step
    /// failures never surface here.
    pub async fn release(&mut self) -> Result<CleanupReport, StateError> {
        if !self.enabled() {
            debug!(serial = %self.ctx.serial, "Cleanup disabled, nothing to do on release");
            return Ok(CleanupReport::default());
        }

        let from = self.fsm.state();
        let baseline = match (&self.baseline, from) {
            (Some(baseline), CleanupState::BaselineCaptured) => baseline,
            _ => {
                return Err(StateError {
                    from,
                    event: SessionEvent::Released,
                })
            }
        };
        self.fsm.process_event(SessionEvent::Released).into_result()?;

        let plan = build_plan(&self.ctx, baseline);
        info!(
            serial = %self.ctx.serial,
            steps = ?plan.step_names(),
            "Session released, cleaning up device"
        );
        let report = plan.run(&self.ctx.serial).await;

        self.fsm
            .process_event(SessionEvent::CleanupFinished)
            .into_result()?;

        if report.is_clean() {
            info!(serial = %self.ctx.serial, "Device returned to pool");
        } else {
            warn!(
                serial = %self.ctx.serial,
                failures = report.total_failures(),
                "Device returned to pool with incomplete cleanup"
            );
        }
        Ok(report)
    }
}

/// Assemble the fixed-order plan for this session's configuration
fn build_plan<'a>(ctx: &'a StepContext, baseline: &'a PackageSet) -> CleanupPlan<'a> {
    let mut plan = CleanupPlan::new();

    plan.push("packages", move || steps::remove_packages(ctx, baseline));

    if ctx.config.cleanup_bluetooth_bonds {
        plan.push("bluetooth-bonds", move || steps::clean_bluetooth_bonds(ctx));
    }
    if ctx.config.cleanup_disable_bluetooth {
        plan.push("bluetooth-disable", move || steps::disable_bluetooth(ctx));
    }
    if ctx.config.folder_cleanup_enabled() {
        plan.push("folders", move || steps::clean_folders(ctx));
    }

    plan.push("complete", move || async move {
        info!(serial = %ctx.serial, "Cleanup complete");
        StepOutcome::default()
    });

    plan
}
