//! Error types for LogMFD runs.

use std::time::Duration;

use thiserror::Error;

/// Everything that can abort a LogMFD run.
///
/// Configuration variants are raised before any dynamics executes and always
/// carry the keyword of the offending parameter. The remaining variants are
/// raised mid-run; none of them is recoverable.
#[derive(Error, Debug)]
pub enum LogMfdError {
    #[error("missing compulsory parameter {0}")]
    MissingParameter(&'static str),

    #[error("parameter {name} expects {expected} values, got {found}")]
    WrongLength {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unrecognized thermostat '{0}' (THERMOSTAT must be NVE, NVT or VS)")]
    UnknownThermostat(String),

    #[error("ALPHA ({alpha}) and GAMMA ({gamma}) are mutually exclusive, give only one of them")]
    ConflictingFlattening { alpha: f64, gamma: f64 },

    #[error("velocity scaling is undefined: kinetic energy of the fictitious variables is zero")]
    ZeroKineticEnergy,

    #[error("non-finite {quantity} at iteration {iteration}")]
    NonFinite {
        quantity: &'static str,
        iteration: u64,
    },

    #[error("expected {expected} collective variable values, got {found}")]
    CvCountMismatch { expected: usize, found: usize },

    #[error("unknown output component '{0}'")]
    UnknownComponent(String),

    #[error("MFD update requested before the first restraint evaluation")]
    NotStarted,

    #[error("replica {rank} timed out after {timeout:?} waiting for collective {operation}")]
    CommTimeout {
        rank: usize,
        operation: &'static str,
        timeout: Duration,
    },

    #[error("replica group is broken: {0}")]
    ReplicaFault(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl LogMfdError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        LogMfdError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors raised while validating the configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LogMfdError::MissingParameter(_)
                | LogMfdError::WrongLength { .. }
                | LogMfdError::InvalidParameter { .. }
                | LogMfdError::UnknownThermostat(_)
                | LogMfdError::ConflictingFlattening { .. }
                | LogMfdError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LogMfdError>;
