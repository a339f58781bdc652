//! The simulation engine boundary.
//!
//! The session only talks to a unit through [`SimulationEngine`]. Two backends exist:
//! a persistent instance that is reset and mutated in place, and a one-shot engine that
//! instantiates the unit for every simulate call from a dictionary of start values.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::unit::{description::ModelDescription, dynamics::Unit, value::Value};

use super::{error::EngineError, options::SimulateOptions, result::RunResult};

/// Available engine backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backend {
    /// Persistent unit instance, see [`crate::engine::instance::InstanceEngine`]
    Instance,
    /// Instantiate per run, see [`crate::engine::oneshot::OneShotEngine`]
    #[default]
    OneShot,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Instance => write!(f, "instance"),
            Backend::OneShot => write!(f, "one-shot"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instance" => Ok(Backend::Instance),
            "one-shot" | "oneshot" => Ok(Backend::OneShot),
            _ => Err(format!("Unknown backend '{s}', expected 'instance' or 'one-shot'")),
        }
    }
}

/// Capabilities the session needs from a simulation backend.
pub trait SimulationEngine: fmt::Debug {
    fn backend(&self) -> Backend;

    /// The loaded unit.
    fn unit(&self) -> &Unit;

    fn description(&self) -> &ModelDescription {
        self.unit().description()
    }

    /// Forgets all values set since the last reset.
    fn reset(&mut self);

    /// Sets the start value of a parameter or initial value for the next run.
    fn set(&mut self, path: &str, value: Value) -> Result<(), EngineError>;

    /// Reads the current value of a variable.
    ///
    /// # Errors
    ///
    /// * [`EngineError::UnknownVariable`] if `path` is not in the description
    /// * [`EngineError::NotAvailable`] if the backend cannot know the value yet
    fn get(&self, path: &str) -> Result<Value, EngineError>;

    /// Simulates from `start` to `stop` with the values set since the last reset.
    ///
    /// # Arguments
    ///
    /// * `start` - Start time of the run
    /// * `stop` - Stop time, must be after `start`
    /// * `options` - Output grid, solver and recorded outputs
    ///
    /// # Returns
    ///
    /// The recorded states and outputs on `options.ncp + 1` communication points.
    ///
    /// # Errors
    ///
    /// * [`EngineError::InvalidHorizon`] or [`EngineError::InvalidOptions`] before
    ///   integrating
    /// * [`EngineError::Integration`] if the solver diverges
    fn simulate(
        &mut self,
        start: f64,
        stop: f64,
        options: &SimulateOptions,
    ) -> Result<RunResult, EngineError>;

    /// Time reached by the last simulation, if any.
    fn time(&self) -> Option<f64>;
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for Box<E> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    fn unit(&self) -> &Unit {
        (**self).unit()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), EngineError> {
        (**self).set(path, value)
    }

    fn get(&self, path: &str) -> Result<Value, EngineError> {
        (**self).get(path)
    }

    fn simulate(
        &mut self,
        start: f64,
        stop: f64,
        options: &SimulateOptions,
    ) -> Result<RunResult, EngineError> {
        (**self).simulate(start, stop, options)
    }

    fn time(&self) -> Option<f64> {
        (**self).time()
    }
}

/// Creates an engine of the requested backend around `unit`.
pub fn engine_for(backend: Backend, unit: Unit) -> Box<dyn SimulationEngine> {
    match backend {
        Backend::Instance => Box::new(super::instance::InstanceEngine::new(unit)),
        Backend::OneShot => Box::new(super::oneshot::OneShotEngine::new(unit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("instance".parse::<Backend>().unwrap(), Backend::Instance);
        assert_eq!("One-Shot".parse::<Backend>().unwrap(), Backend::OneShot);
        assert!("pyfmi".parse::<Backend>().is_err());
    }
}
