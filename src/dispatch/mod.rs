//! Bounded concurrency for remote-command fan-out
//!
//! This module handles:
//! - Admitting at most N concurrent tasks, FIFO among waiters
//! - Mapping a batch of items through the dispatcher and collecting outcomes

mod dispatcher;
mod fan_out;

pub use fan_out::fan_out;
