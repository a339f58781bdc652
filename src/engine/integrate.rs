//! Fixed-step integration of a bound unit over a communication grid.
//!
//! The grid has `ncp + 1` points from start to stop. The last point is the stop time
//! itself, so a run over `[0, 12]` always reports a final time of exactly `12`.

use peroxide::fuga::{ODEIntegrator, ODEProblem, RK4, RK5};

use crate::unit::dynamics::BoundSystem;

use super::{
    error::EngineError,
    options::{SimulateOptions, Solver},
    result::RunResult,
};

/// Adapter exposing a bound unit as a peroxide problem.
struct UnitProblem<'a> {
    system: &'a dyn BoundSystem,
}

impl ODEProblem for UnitProblem<'_> {
    fn rhs(&self, t: f64, y: &[f64], dy: &mut [f64]) -> anyhow::Result<()> {
        self.system.rhs(t, y, dy);
        Ok(())
    }
}

/// Communication points of a run.
pub(crate) fn communication_grid(start: f64, stop: f64, ncp: usize) -> Vec<f64> {
    let width = stop - start;
    let mut grid: Vec<f64> = (0..=ncp)
        .map(|k| start + width * (k as f64) / (ncp as f64))
        .collect();
    if let Some(last) = grid.last_mut() {
        *last = stop;
    }
    grid
}

/// Integrates `system` from `y0` over `[start, stop]`.
///
/// States are always recorded. Algebraic outputs are recorded when the options' output
/// filter lets them through.
pub(crate) fn integrate(
    system: &dyn BoundSystem,
    y0: Vec<f64>,
    start: f64,
    stop: f64,
    options: &SimulateOptions,
) -> Result<RunResult, EngineError> {
    if start >= stop || !start.is_finite() || !stop.is_finite() {
        return Err(EngineError::InvalidHorizon { start, stop });
    }
    options.validate()?;

    match options.solver {
        Solver::RK4 => run(RK4, system, y0, start, stop, options),
        Solver::RK5 => run(RK5::default(), system, y0, start, stop, options),
    }
}

fn run<S: ODEIntegrator>(
    solver: S,
    system: &dyn BoundSystem,
    mut y: Vec<f64>,
    start: f64,
    stop: f64,
    options: &SimulateOptions,
) -> Result<RunResult, EngineError> {
    let problem = UnitProblem { system };
    let grid = communication_grid(start, stop, options.ncp);
    let mut recorder = Recorder::new(system, options, grid.len());

    recorder.record(grid[0], &y);
    for window in grid.windows(2) {
        let (from, to) = (window[0], window[1]);
        let dt = (to - from) / options.substeps as f64;
        let mut t = from;
        for _ in 0..options.substeps {
            solver
                .step(&problem, t, &mut y, dt)
                .map_err(|e| EngineError::Integration(e.to_string()))?;
            t += dt;
        }

        if y.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::Integration(format!(
                "state became non-finite at t = {to}"
            )));
        }
        recorder.record(to, &y);
    }

    Ok(recorder.finish(grid))
}

/// Collects states and outputs column-wise.
struct Recorder<'a> {
    system: &'a dyn BoundSystem,
    options: &'a SimulateOptions,
    states: Vec<Vec<f64>>,
    outputs: Vec<(String, Vec<f64>)>,
}

impl<'a> Recorder<'a> {
    fn new(system: &'a dyn BoundSystem, options: &'a SimulateOptions, points: usize) -> Self {
        Self {
            system,
            options,
            states: vec![Vec::with_capacity(points); system.state_names().len()],
            outputs: Vec::new(),
        }
    }

    fn record(&mut self, t: f64, y: &[f64]) {
        for (column, value) in self.states.iter_mut().zip(y) {
            column.push(*value);
        }

        let outputs = self
            .system
            .outputs(t, y)
            .into_iter()
            .filter(|(name, _)| self.options.records(name));

        if self.outputs.is_empty() {
            self.outputs = outputs.map(|(name, value)| (name, vec![value])).collect();
        } else {
            for ((_, column), (_, value)) in self.outputs.iter_mut().zip(outputs) {
                column.push(value);
            }
        }
    }

    fn finish(self, time: Vec<f64>) -> RunResult {
        let mut result = RunResult::new(time);
        for (name, column) in self.system.state_names().iter().zip(self.states) {
            result.add_series(name.clone(), column);
        }
        for (name, column) in self.outputs {
            result.add_series(name, column);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engine::options::SimulateOptionsBuilder;

    /// dx/dt = -k x
    struct Decay {
        names: Vec<String>,
        k: f64,
    }

    impl BoundSystem for Decay {
        fn state_names(&self) -> &[String] {
            &self.names
        }

        fn initial_state(&self) -> Vec<f64> {
            vec![1.0]
        }

        fn rhs(&self, _t: f64, y: &[f64], dy: &mut [f64]) {
            dy[0] = -self.k * y[0];
        }

        fn outputs(&self, _t: f64, y: &[f64]) -> Vec<(String, f64)> {
            vec![("twice".to_string(), 2.0 * y[0])]
        }
    }

    fn decay() -> Decay {
        Decay {
            names: vec!["x".to_string()],
            k: 0.5,
        }
    }

    #[test]
    fn test_grid_ends_exactly_at_stop() {
        let grid = communication_grid(0.0, 12.0, 500);
        assert_eq!(grid.len(), 501);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[500], 12.0);

        let grid = communication_grid(0.1, 0.7, 3);
        assert_eq!(*grid.last().unwrap(), 0.7);
    }

    #[test]
    fn test_decay_matches_analytic_solution() {
        let system = decay();
        let result = integrate(&system, vec![1.0], 0.0, 4.0, &SimulateOptions::fast()).unwrap();

        assert_eq!(result.len(), 101);
        assert_relative_eq!(
            result.final_value("x").unwrap(),
            (-0.5_f64 * 4.0).exp(),
            max_relative = 1e-6
        );
        assert_relative_eq!(
            result.final_value("twice").unwrap(),
            2.0 * result.final_value("x").unwrap()
        );
    }

    #[test]
    fn test_rk5_solver() {
        let system = decay();
        let options = SimulateOptionsBuilder::default()
            .solver(Solver::RK5)
            .ncp(50_usize)
            .build()
            .unwrap();
        let result = integrate(&system, vec![1.0], 0.0, 2.0, &options).unwrap();
        assert_relative_eq!(
            result.final_value("x").unwrap(),
            (-1.0_f64).exp(),
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_output_filter_keeps_states() {
        let system = decay();
        let options = SimulateOptionsBuilder::default()
            .outputs(Some(vec![]))
            .build()
            .unwrap();
        let result = integrate(&system, vec![1.0], 0.0, 1.0, &options).unwrap();
        assert!(result.contains("x"));
        assert!(!result.contains("twice"));
    }

    #[test]
    fn test_rejects_empty_horizon() {
        let system = decay();
        let result = integrate(&system, vec![1.0], 2.0, 2.0, &SimulateOptions::standard());
        assert!(matches!(result, Err(EngineError::InvalidHorizon { .. })));
    }
}
