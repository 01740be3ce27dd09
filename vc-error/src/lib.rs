//! Error types for vcool
//!
//! Each concern of the daemon gets its own small enum so callers can match on
//! exactly what went wrong; `VcoolError` unifies them for the binary and for
//! code that crosses several concerns.

use std::io;
use std::path::PathBuf;

/// Result type alias using VcoolError
pub type Result<T> = std::result::Result<T, VcoolError>;

/// Rejection reasons for a single strategy-file line
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty rule line")]
    Empty,

    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("malformed condition: {0}")]
    MalformedCondition(String),

    #[error("condition mixes '|' and '&': {0}")]
    AmbiguousCondition(String),

    #[error("unexpected token after action: {0}")]
    UnexpectedToken(String),
}

/// GPIO line failures
#[derive(thiserror::Error, Debug)]
pub enum GpioError {
    #[error("Failed to request line {offset} on {chip}: {reason}")]
    Request {
        chip: PathBuf,
        offset: u32,
        reason: String,
    },

    #[error("Failed to set value on line {offset}: {reason}")]
    Write {
        offset: u32,
        reason: String,
    },

    #[error("GPIO line already released")]
    Released,
}

/// Failures of a fan duty-cycle transition
#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    #[error("Failed to start PWM generator: {0}")]
    StartFailed(#[source] io::Error),

    #[error(transparent)]
    Gpio(#[from] GpioError),
}

/// PID-file singleton failures
#[derive(thiserror::Error, Debug)]
pub enum InstanceError {
    #[error("Failed to read PID file {path}: {source}")]
    PidFileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write PID file {path}: {source}")]
    PidFileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: i32,
        source: io::Error,
    },
}

/// Unified error type for all vcool operations
#[derive(thiserror::Error, Debug)]
pub enum VcoolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Gpio(#[from] GpioError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Instance(#[from] InstanceError),
}

impl VcoolError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
