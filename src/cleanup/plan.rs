//! Ordered cleanup plan

use futures::future::BoxFuture;
use std::future::Future;
use tracing::{debug, warn};

/// What one step did. Steps never fail as a whole; they count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Remote operations attempted
    pub attempted: usize,
    /// Of those, how many failed
    pub failed: usize,
}

impl StepOutcome {
    /// Count one attempted operation
    pub fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if !ok {
            self.failed += 1;
        }
    }

    pub fn from_results(results: &[bool]) -> Self {
        let mut outcome = Self::default();
        for ok in results {
            outcome.record(*ok);
        }
        outcome
    }

    pub fn merge(&mut self, other: StepOutcome) {
        self.attempted += other.attempted;
        self.failed += other.failed;
    }
}

type StepAction<'a> = Box<dyn FnOnce() -> BoxFuture<'a, StepOutcome> + Send + 'a>;

struct CleanupStep<'a> {
    name: &'static str,
    action: StepAction<'a>,
}

/// Per-step results of one release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub steps: Vec<(&'static str, StepOutcome)>,
}

impl CleanupReport {
    #[cfg(test)]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }

    #[cfg(test)]
    pub fn outcome(&self, name: &str) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|(step, _)| *step == name)
            .map(|(_, outcome)| *outcome)
    }

    pub fn total_failures(&self) -> usize {
        self.steps.iter().map(|(_, outcome)| outcome.failed).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }
}

/// Independent named steps, run strictly one after another.
///
/// Work inside a step may fan out; steps themselves never overlap.
#[derive(Default)]
pub struct CleanupPlan<'a> {
    steps: Vec<CleanupStep<'a>>,
}

impl<'a> CleanupPlan<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a deferred step
    pub fn push<F, Fut>(&mut self, name: &'static str, action: F)
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = StepOutcome> + Send + 'a,
    {
        self.steps.push(CleanupStep {
            name,
            action: Box::new(move || -> BoxFuture<'a, StepOutcome> { Box::pin(action()) }),
        });
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name).collect()
    }

    /// Run every step exactly once, in order
    pub async fn run(self, serial: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        for step in self.steps {
            debug!(serial, step = step.name, "Running cleanup step");
            let outcome = (step.action)().await;
            if outcome.failed > 0 {
                warn!(
                    serial,
                    step = step.name,
                    failed = outcome.failed,
                    attempted = outcome.attempted,
                    "Cleanup step finished with failures"
                );
            }
            report.steps.push((step.name, outcome));
        }

        report
    }
}
