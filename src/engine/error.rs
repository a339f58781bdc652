//! Engine Error Module
//!
//! Errors raised at the boundary to the simulation engine: variable lookups against the
//! model description, start values handed to the unit, and the numerical integration.

use thiserror::Error;

use crate::io::IOError;

/// Errors returned by [`SimulationEngine`](crate::engine::SimulationEngine) operations
/// and by loading a unit.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The path is not in the model description.
    #[error("Unknown model variable '{0}'")]
    UnknownVariable(String),
    /// Only parameters and time-invariant variables can be set.
    #[error("Variable '{0}' cannot be set before a run")]
    NotSettable(String),
    #[error("Start value missing or not numeric for '{0}'")]
    MissingStartValue(String),
    /// The value is only known once the engine has run.
    #[error("Information on '{0}' is available after the first simulation")]
    NotAvailable(String),
    #[error("Variable '{0}' is not logged in the last result")]
    NotLogged(String),
    #[error("No unit dynamics registered for model '{0}'")]
    UnknownModel(String),
    /// Stop time not after start time.
    #[error("Invalid simulation horizon: start {start} must be before stop {stop}")]
    InvalidHorizon { start: f64, stop: f64 },
    #[error("Invalid simulation options: {0}")]
    InvalidOptions(String),
    /// The solver produced non-finite values.
    #[error("Integration failed: {0}")]
    Integration(String),
    #[error("Unit package error: {0}")]
    Package(#[from] IOError),
}
