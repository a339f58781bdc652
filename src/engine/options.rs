//! Options for a single simulate call.
//!
//! The number of communication points (`ncp`) decides the output grid: a run over a
//! horizon `h` reports values every `h / ncp` time units. Between two communication
//! points the integrator takes `substeps` fixed steps.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Fixed-step integrators available to the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Solver {
    /// Classic fourth order Runge-Kutta
    #[default]
    RK4,
    /// Fifth order Runge-Kutta, stepped with a fixed size
    RK5,
}

/// Configuration of a simulate call
///
/// # Examples
///
/// ```
/// use fmu_explore::prelude::SimulateOptionsBuilder;
///
/// let options = SimulateOptionsBuilder::default()
///     .ncp(100_usize)
///     .build()
///     .unwrap();
/// assert_eq!(options.substeps, 4);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct SimulateOptions {
    /// Number of output intervals over the horizon
    #[builder(default = "500")]
    pub ncp: usize,
    /// Integrator steps per output interval
    #[builder(default = "4")]
    pub substeps: usize,
    #[builder(default)]
    pub solver: Solver,
    /// Variables to record besides the states. `None` records every output.
    #[builder(default)]
    #[serde(default)]
    pub outputs: Option<Vec<String>>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self::standard()
    }
}

impl SimulateOptions {
    /// The standard profile with 500 communication points.
    pub fn standard() -> Self {
        Self {
            ncp: 500,
            substeps: 4,
            solver: Solver::RK4,
            outputs: None,
        }
    }

    /// A coarse profile with 100 communication points.
    pub fn fast() -> Self {
        Self {
            ncp: 100,
            ..Self::standard()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), EngineError> {
        if self.ncp == 0 {
            return Err(EngineError::InvalidOptions(
                "at least one communication point is required".to_string(),
            ));
        }
        if self.substeps == 0 {
            return Err(EngineError::InvalidOptions(
                "at least one integration step per interval is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a variable should be recorded.
    pub(crate) fn records(&self, name: &str) -> bool {
        match &self.outputs {
            Some(outputs) => outputs.iter().any(|o| o == name),
            None => true,
        }
    }
}
