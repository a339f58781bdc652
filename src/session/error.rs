//! Errors of the exploration session.

use thiserror::Error;

use crate::{engine::error::EngineError, presentation::figure::PresentationError};

/// Conditions that abort a run or reject a session call.
#[derive(Error, Debug)]
pub enum ExploreError {
    /// A tracked state has no initial-value name. Aborts a continuation.
    #[error("State '{0}' has an index too wide for initial-value naming (at most 999 states)")]
    UnsupportedIndexWidth(String),
    /// Parameters without a value. Aborts every run.
    #[error("Value missing: {}", .0.join(", "))]
    ValueMissing(Vec<String>),
    /// A continuation was requested before any completed run.
    #[error("Simulation is first done with mode 'init'")]
    ContinuationBeforeInitial,
    #[error("Simulation mode '{0}' not recognised, expected 'init' or 'cont'")]
    ModeNotRecognised(String),
    /// Reported by the setters, never aborts a run.
    #[error("Parameter '{0}' not in the parameter list")]
    UnknownParameter(String),
    /// Parameter name and the rejected value.
    #[error("Value '{1}' for parameter '{0}' is not numeric")]
    NotNumeric(String, String),
    #[error("Parameter '{0}' is not an initial value")]
    NotAnInitialValue(String),
    /// Drawing was requested before any completed run.
    #[error("No result to show, run a simulation first")]
    NoResult,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Presentation(#[from] PresentationError),
}
