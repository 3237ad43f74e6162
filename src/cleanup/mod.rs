//! Device cleanup on session release
//!
//! This module handles:
//! - Device sessions and their validated cleanup policy
//! - Capturing the baseline package set at session start
//! - Building and running the ordered, fault-isolated cleanup plan

mod orchestrator;
mod plan;
mod session;
mod steps;

pub use orchestrator::CleanupOrchestrator;
pub use session::DeviceSession;
