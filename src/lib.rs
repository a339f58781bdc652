//! fmu-explore
//!
//! Interactive exploration of a simulation unit of a bioprocess, here the yeast batch
//! cultivation `BPL_YEAST_COB.Batch`. The library provides:
//! - A model description and the dynamics of the built-in unit
//! - Two simulation engines, a persistent instance and a one-shot runner
//! - A session that sets parameters, runs and continues simulations
//! - Plots of the results in several layouts
//! - Textual descriptions of parameters, variables and the system

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::engine::error::*;
    pub use crate::engine::instance::*;
    pub use crate::engine::oneshot::*;
    pub use crate::engine::options::*;
    pub use crate::engine::result::*;
    pub use crate::engine::traits::*;
    pub use crate::info::*;
    pub use crate::io::*;
    pub use crate::presentation::figure::*;
    pub use crate::presentation::layout::*;
    pub use crate::presentation::style::*;
    pub use crate::session::application::*;
    pub use crate::session::config::*;
    pub use crate::session::driver::*;
    pub use crate::session::error::*;
    pub use crate::session::naming::*;
    pub use crate::session::params::*;
    pub use crate::session::report::*;
    pub use crate::session::state::*;
    pub use crate::unit::description::*;
    pub use crate::unit::dynamics::*;
    pub use crate::unit::value::*;
    pub use crate::unit::yeast::*;
}

/// Simulation units: model descriptions, values and dynamics
pub mod unit {
    pub use crate::unit::dynamics::Unit;
    pub use crate::unit::value::{Value, ValueMap};

    /// Variable directory of a unit
    pub mod description;
    /// Right-hand sides bound to a set of start values
    pub mod dynamics;
    pub mod value;
    /// The yeast batch cultivation
    pub mod yeast;
}

/// Simulation engines
pub mod engine {
    pub use crate::engine::traits::{engine_for, Backend, SimulationEngine};
    pub use peroxide::fuga::{RK4, RK5};

    /// Error types for engine failures
    pub mod error;
    /// Persistent unit instance
    pub mod instance;
    pub(crate) mod integrate;
    /// Instantiate-per-run engine
    pub mod oneshot;
    /// Integration options
    pub mod options;
    /// Time series of a run
    pub mod result;
    /// The engine trait
    pub mod traits;
}

/// Parameter handling and the run driver
pub mod session {
    pub use crate::session::driver::{RunMode, RunOutcome, Session};

    pub mod application;
    /// Session presets loaded from JSON
    pub mod config;
    pub mod driver;
    pub mod error;
    /// Initial-value naming conventions
    pub mod naming;
    /// Parameter registry
    pub mod params;
    /// Issues found while setting values
    pub mod report;
    /// States carried between runs
    pub mod state;
}

/// Plotting of run results
pub mod presentation {
    pub mod figure;
    /// Diagram layouts
    pub mod layout;
    pub mod style;
}

/// Describing the unit and the session
pub mod info;

/// Unit packages and process diagrams
pub mod io;
