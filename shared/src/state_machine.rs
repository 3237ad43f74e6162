//! Session Cleanup State Machine
//!
//! Defines the valid lifecycle of a device session with respect to cleanup:
//! `Idle -> BaselineCaptured -> Cleaning -> Done`. Every state is left at
//! most once; `Done` is terminal and there are no retries.

use crate::error::StateError;

/// Cleanup lifecycle of one device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupState {
    /// Session attached, nothing recorded yet
    Idle,
    /// Baseline package set recorded
    BaselineCaptured,
    /// Release event consumed, cleanup plan running
    Cleaning,
    /// Every configured step attempted exactly once
    Done,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Baseline package set captured at session start
    BaselineCaptured,
    /// The session was released by its user
    Released,
    /// The cleanup plan ran to the end
    CleanupFinished,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and state changed
    Success(CleanupState),
    /// Transition was invalid from current state
    Invalid { from: CleanupState, event: SessionEvent },
}

impl TransitionResult {
    /// Convert into a `Result`, turning an invalid transition into a `StateError`
    pub fn into_result(self) -> Result<CleanupState, StateError> {
        match self {
            TransitionResult::Success(state) => Ok(state),
            TransitionResult::Invalid { from, event } => Err(StateError { from, event }),
        }
    }
}

/// The cleanup state machine for one session
#[derive(Debug)]
pub struct CleanupStateMachine {
    current_state: CleanupState,
    entered_at_ms: u64,
}

impl Default for CleanupStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupStateMachine {
    /// Create a new state machine in Idle state
    pub fn new() -> Self {
        Self {
            current_state: CleanupState::Idle,
            entered_at_ms: crate::now_ms(),
        }
    }

    /// Get current state
    pub fn state(&self) -> CleanupState {
        self.current_state
    }

    /// Timestamp at which the current state was entered
    pub fn entered_at_ms(&self) -> u64 {
        self.entered_at_ms
    }

    pub fn is_done(&self) -> bool {
        self.current_state == CleanupState::Done
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: SessionEvent) -> TransitionResult {
        match self.next_state(event) {
            Some(state) => {
                self.current_state = state;
                self.entered_at_ms = crate::now_ms();
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current_state,
                event,
            },
        }
    }

    fn next_state(&self, event: SessionEvent) -> Option<CleanupState> {
        use CleanupState::*;

        match (self.current_state, event) {
            (Idle, SessionEvent::BaselineCaptured) => Some(BaselineCaptured),
            (BaselineCaptured, SessionEvent::Released) => Some(Cleaning),
            (Cleaning, SessionEvent::CleanupFinished) => Some(Done),
            _ => None,
        }
    }
}
