//! Error taxonomy for device reclamation

use thiserror::Error;

use crate::state_machine::{CleanupState, SessionEvent};

/// Invalid cleanup configuration. Always fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cleanup folder {path:?} is under protected path {protected:?}")]
    ProtectedPath { path: String, protected: &'static str },

    #[error("Cleanup folder {0:?} is not an absolute path")]
    NotAbsolute(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures talking to a device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The remote command could not be executed (device gone, adb down, ...)
    #[error("Transport error on {serial}: {message}")]
    Transport { serial: String, message: String },

    /// Boot completion was not observed before the deadline
    #[error("Timed out on {serial} after {waited_ms}ms waiting for boot completion")]
    Timeout { serial: String, waited_ms: u64 },

    /// The device answered, but not in a form we understand
    #[error("Unexpected output from {serial} for `{command}`: {output}")]
    UnexpectedOutput {
        serial: String,
        command: String,
        output: String,
    },
}

impl DeviceError {
    pub fn transport(serial: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            serial: serial.into(),
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A lifecycle signal arrived in a state that does not accept it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Session event {event:?} is not valid in state {from:?}")]
pub struct StateError {
    pub from: CleanupState,
    pub event: SessionEvent,
}
