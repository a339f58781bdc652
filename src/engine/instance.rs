//! Persistent-instance engine.
//!
//! The unit is instantiated once and mutated in place: a run is `reset`, followed by
//! `set` for every override, followed by `simulate`. Reads go to the live instance, so
//! after a run a state reads as its final value and before a run as its initial value.

use crate::unit::{
    dynamics::Unit,
    value::{Value, ValueMap},
};

use super::{
    error::EngineError,
    integrate::integrate,
    options::SimulateOptions,
    result::RunResult,
    traits::{Backend, SimulationEngine},
};

/// Engine keeping one live instance of the unit across runs.
#[derive(Debug)]
pub struct InstanceEngine {
    unit: Unit,
    values: ValueMap,
    last: Option<RunResult>,
}

impl InstanceEngine {
    /// Instantiates `unit` with its declared start values.
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            values: ValueMap::new(),
            last: None,
        }
    }

    /// Value of a state or output at the current time of the instance.
    ///
    /// Before the first run this is the start of the next run. After a run the outputs
    /// are evaluated at the final state, so variables the output filter left out still
    /// read as their current value.
    fn evaluate(&self, path: &str) -> Result<Option<f64>, EngineError> {
        let system = self
            .unit
            .dynamics()
            .bind(&self.unit.merged_values(&self.values))?;

        let (t, y) = match &self.last {
            Some(result) => {
                let y = system
                    .state_names()
                    .iter()
                    .map(|state| {
                        result
                            .final_value(state)
                            .ok_or_else(|| EngineError::NotLogged(state.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (result.final_time().unwrap_or_default(), y)
            }
            None => (0.0, system.initial_state()),
        };

        if let Some(i) = system.state_names().iter().position(|s| s == path) {
            return Ok(Some(y[i]));
        }

        Ok(system
            .outputs(t, &y)
            .into_iter()
            .find(|(name, _)| name == path)
            .map(|(_, value)| value))
    }
}

impl SimulationEngine for InstanceEngine {
    fn backend(&self) -> Backend {
        Backend::Instance
    }

    fn unit(&self) -> &Unit {
        &self.unit
    }

    fn reset(&mut self) {
        log::debug!("resetting unit instance");
        self.values.clear();
        self.last = None;
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), EngineError> {
        self.unit.check_settable(path, &value)?;
        self.values.insert(path.to_string(), value);
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Value, EngineError> {
        let variable = self
            .unit
            .description()
            .variable(path)
            .ok_or_else(|| EngineError::UnknownVariable(path.to_string()))?;

        if let Some(value) = self.values.get(path) {
            return Ok(value.clone());
        }

        if let Some(value) = self.last.as_ref().and_then(|r| r.final_value(path)) {
            return Ok(Value::Real(value));
        }

        if let Some(start) = &variable.start {
            return Ok(start.clone());
        }

        self.evaluate(path)?
            .map(Value::Real)
            .ok_or_else(|| EngineError::NotAvailable(path.to_string()))
    }

    fn simulate(
        &mut self,
        start: f64,
        stop: f64,
        options: &SimulateOptions,
    ) -> Result<RunResult, EngineError> {
        let system = self
            .unit
            .dynamics()
            .bind(&self.unit.merged_values(&self.values))?;

        let result = integrate(system.as_ref(), system.initial_state(), start, stop, options)?;
        self.last = Some(result.clone());
        Ok(result)
    }

    fn time(&self) -> Option<f64> {
        self.last.as_ref().and_then(RunResult::final_time)
    }
}
