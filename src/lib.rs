//! Logarithmic mean-force dynamics (LogMFD) and its replica-parallel
//! variant (LogPD) for free-energy calculation along collective variables.

pub mod core {
    pub mod geometry;
    pub mod solve;
    pub mod state;
}

pub mod laws;

pub mod platform {
    pub mod comm;
}

pub mod investigation {
    pub mod record;
}

pub mod config;
pub mod error;
pub mod host;
pub mod simulation;

pub use config::{LogMfdConfig, Parameters, Units};
pub use error::{LogMfdError, Result};
pub use simulation::LogMfd;
