//! One-shot engine.
//!
//! Every simulate call instantiates the unit from its description with the start values
//! set since the last reset. No instance survives the call, so reads are answered from
//! what is known about the last run: its start values, the declared starts of constant
//! and fixed variables, and the final row of its result.

use crate::unit::{
    description::Variability,
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

/// Engine instantiating the unit afresh for every simulate call.
#[derive(Debug)]
pub struct OneShotEngine {
    unit: Unit,
    pending: ValueMap,
    start_values: Option<ValueMap>,
    last: Option<RunResult>,
}

impl OneShotEngine {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            pending: ValueMap::new(),
            start_values: None,
            last: None,
        }
    }

    /// Start values handed to the last simulate call.
    pub fn start_values(&self) -> Option<&ValueMap> {
        self.start_values.as_ref()
    }
}

impl SimulationEngine for OneShotEngine {
    fn backend(&self) -> Backend {
        Backend::OneShot
    }

    fn unit(&self) -> &Unit {
        &self.unit
    }

    fn reset(&mut self) {
        self.pending.clear();
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), EngineError> {
        self.unit.check_settable(path, &value)?;
        self.pending.insert(path.to_string(), value);
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Value, EngineError> {
        let variable = self
            .unit
            .description()
            .variable(path)
            .ok_or_else(|| EngineError::UnknownVariable(path.to_string()))?;

        let start_values = self
            .start_values
            .as_ref()
            .ok_or_else(|| EngineError::NotAvailable(path.to_string()))?;

        if let Some(value) = start_values.get(path) {
            return Ok(value.clone());
        }

        if variable.is_time_invariant() {
            if let Some(start) = &variable.start {
                return Ok(start.clone());
            }
        }

        if variable.variability == Variability::Continuous {
            return self
                .last
                .as_ref()
                .and_then(|r| r.final_value(path))
                .map(Value::Real)
                .ok_or_else(|| EngineError::NotLogged(path.to_string()));
        }

        Err(EngineError::NotAvailable(path.to_string()))
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
            .bind(&self.unit.merged_values(&self.pending))?;

        let result = integrate(system.as_ref(), system.initial_state(), start, stop, options)?;
        self.start_values = Some(self.pending.clone());
        self.last = Some(result.clone());
        Ok(result)
    }

    fn time(&self) -> Option<f64> {
        self.last.as_ref().and_then(RunResult::final_time)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        engine::options::SimulateOptionsBuilder, session::naming::InitialValueMarker,
        unit::yeast::yeast_batch_unit,
    };

    fn engine() -> OneShotEngine {
        OneShotEngine::new(yeast_batch_unit(InitialValueMarker::Start))
    }

    #[test]
    fn test_get_before_first_run_is_not_available() {
        let engine = engine();
        let err = engine.get("bioreactor.culture.mum").unwrap_err();
        assert!(matches!(err, EngineError::NotAvailable(_)));
    }

    #[test]
    fn test_get_prefers_start_values() {
        let mut engine = engine();
        engine.set("bioreactor.culture.mum", Value::Real(0.3)).unwrap();
        engine.simulate(0.0, 1.0, &SimulateOptions::fast()).unwrap();

        assert_eq!(engine.get("bioreactor.culture.mum").unwrap(), Value::Real(0.3));
        assert_eq!(engine.get("bioreactor.culture.qGr").unwrap(), Value::Real(0.5));
        assert_eq!(engine.get("liquidphase.G").unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_get_continuous_reads_final_value() {
        let mut engine = engine();
        let result = engine.simulate(0.0, 1.0, &SimulateOptions::fast()).unwrap();

        let glucose = engine.get("bioreactor.c[2]").unwrap().as_f64().unwrap();
        assert_relative_eq!(glucose, result.final_value("bioreactor.c[2]").unwrap());
    }

    #[test]
    fn test_get_unrecorded_variable_is_not_logged() {
        let mut engine = engine();
        let options = SimulateOptionsBuilder::default()
            .ncp(10_usize)
            .outputs(Some(vec!["bioreactor.c[1]".to_string()]))
            .build()
            .unwrap();
        engine.simulate(0.0, 1.0, &options).unwrap();

        let err = engine.get("bioreactor.culture.mu").unwrap_err();
        assert!(matches!(err, EngineError::NotLogged(_)));
    }

    #[test]
    fn test_reset_keeps_last_start_values() {
        let mut engine = engine();
        engine.set("bioreactor.V_start", Value::Real(3.0)).unwrap();
        engine.simulate(0.0, 1.0, &SimulateOptions::fast()).unwrap();
        engine.reset();

        assert_eq!(engine.get("bioreactor.V_start").unwrap(), Value::Real(3.0));
    }
}
