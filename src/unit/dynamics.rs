//! The simulation unit: a model description paired with executable dynamics.
//!
//! A [`Unit`] is what an engine loads. Its [`Dynamics`] are opaque to the rest of the
//! crate: they are bound to a set of start values, after which the engine only asks
//! for the initial state, the right-hand side and the algebraic outputs.

use std::{fmt, path::PathBuf, sync::Arc};

use crate::engine::error::EngineError;

use super::{
    description::ModelDescription,
    value::{Value, ValueMap},
};

/// Executable dynamics of a unit, before parameters are bound.
pub trait Dynamics: fmt::Debug + Send + Sync {
    /// Model name the dynamics implement. Must match the description's `model_name`.
    fn model_name(&self) -> &str;

    /// Binds the dynamics to a complete set of values (declared starts merged with
    /// overrides). Fails when a required start value is missing or not numeric.
    fn bind(&self, values: &ValueMap) -> Result<Box<dyn BoundSystem>, EngineError>;
}

/// Dynamics bound to concrete parameter values, ready to integrate.
pub trait BoundSystem {
    /// State paths in the order of the state vector.
    fn state_names(&self) -> &[String];

    /// State vector at the start of a run.
    fn initial_state(&self) -> Vec<f64>;

    /// Writes the time derivative of `y` into `dy`.
    fn rhs(&self, t: f64, y: &[f64], dy: &mut [f64]);

    /// Algebraic variables computed from the state.
    fn outputs(&self, t: f64, y: &[f64]) -> Vec<(String, f64)>;
}

/// A loaded simulation unit.
#[derive(Debug, Clone)]
pub struct Unit {
    description: ModelDescription,
    dynamics: Arc<dyn Dynamics>,
    package: Option<PathBuf>,
}

impl Unit {
    /// Pairs a description with dynamics.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownModel`] if the dynamics implement a different model
    /// than the description declares.
    pub fn new(
        description: ModelDescription,
        dynamics: Arc<dyn Dynamics>,
    ) -> Result<Self, EngineError> {
        if dynamics.model_name() != description.model_name {
            return Err(EngineError::UnknownModel(description.model_name.clone()));
        }

        Ok(Self {
            description,
            dynamics,
            package: None,
        })
    }

    /// Variables, start values and metadata of the unit.
    pub fn description(&self) -> &ModelDescription {
        &self.description
    }

    /// The equations the engines integrate.
    pub fn dynamics(&self) -> &dyn Dynamics {
        self.dynamics.as_ref()
    }

    /// Directory the unit was loaded from, if any.
    pub fn package(&self) -> Option<&PathBuf> {
        self.package.as_ref()
    }

    pub(crate) fn with_package(mut self, package: PathBuf) -> Self {
        self.package = Some(package);
        self
    }

    /// Declared start values merged with `overrides`.
    pub fn merged_values(&self, overrides: &ValueMap) -> ValueMap {
        let mut values = self.description.start_values();
        values.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        values
    }

    /// Checks that `path` exists and may be set before a run.
    pub fn check_settable(&self, path: &str, value: &Value) -> Result<(), EngineError> {
        let variable = self
            .description
            .variable(path)
            .ok_or_else(|| EngineError::UnknownVariable(path.to_string()))?;

        if !variable.is_settable() {
            return Err(EngineError::NotSettable(path.to_string()));
        }

        if value.is_missing() {
            return Err(EngineError::MissingStartValue(path.to_string()));
        }

        Ok(())
    }
}
