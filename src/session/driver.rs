//! The run driver.
//!
//! A [`Session`] owns the engine, the parameter and state stores and the figure. Each
//! call to [`Session::simu`] moves through the phases `Ready -> Running -> Completed`:
//!
//! * `Initial` runs apply every parameter to a freshly reset engine and simulate from 0.
//! * `Continued` runs seed the initial values of every tracked state with the values
//!   stored after the previous run and simulate from where that run ended.
//!
//! Failed preconditions never propagate: the run is aborted, the reason is logged and
//! returned in the [`RunOutcome`].

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    engine::{
        options::SimulateOptions,
        result::{RunResult, TIME},
        traits::{engine_for, SimulationEngine},
    },
    presentation::{
        figure::{Figure, DEFAULT_TITLE},
        layout::PlotLayout,
        style::LineStyle,
    },
    unit::{dynamics::Unit, value::Value},
};

use super::{
    application::Application,
    config::SessionConfig,
    error::ExploreError,
    naming::initial_value_path,
    params::ParameterStore,
    report::Report,
    state::StateStore,
};

/// Kind of run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunMode {
    /// Start from time zero with the configured initial values
    #[default]
    Initial,
    /// Continue from the final state of the previous run
    Continued,
}

impl FromStr for RunMode {
    type Err = ExploreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Initial" | "initial" | "init" => Ok(RunMode::Initial),
            "Continued" | "continued" | "cont" => Ok(RunMode::Continued),
            _ => Err(ExploreError::ModeNotRecognised(s.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Initial => write!(f, "init"),
            RunMode::Continued => write!(f, "cont"),
        }
    }
}

/// Where the driver stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Some parameter has no value yet
    Unconfigured,
    /// Every parameter has a value and no run has completed yet
    Ready,
    Running,
    /// A run has completed, continuations are possible
    Completed,
}

/// Outcome of a call to [`Session::simu`].
///
/// A run never fails with an error value. Precondition failures and engine errors end
/// the run early and are carried in [`RunOutcome::Aborted`].
#[derive(Debug)]
pub enum RunOutcome {
    /// The run reached its stop time and its result replaced the previous one.
    Completed {
        /// Time the run started at
        start: f64,
        /// Time the run ended at
        stop: f64,
        /// Style the results were drawn with, if the figure could draw them
        style: Option<LineStyle>,
    },
    /// The run did not start or did not finish. The session keeps its previous result.
    Aborted(ExploreError),
}

impl RunOutcome {
    /// Returns true if the run reached its stop time.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// The reason the run was aborted, if it was.
    pub fn error(&self) -> Option<&ExploreError> {
        match self {
            RunOutcome::Aborted(err) => Some(err),
            RunOutcome::Completed { .. } => None,
        }
    }
}

/// An exploration session around one engine.
///
/// The session replaces process-wide state with one owned object: the engine, the
/// parameter and state stores, the figure and the last result live here and every
/// operation goes through it.
///
/// # Examples
///
/// ```
/// use fmu_explore::prelude::*;
///
/// let config = SessionConfig::for_backend(Backend::OneShot);
/// let application = yeast_batch(config.marker);
/// let mut session = Session::for_unit(yeast_batch_unit(config.marker), config, application);
///
/// session.set_parameters([("VX_start", 2.0)]);
/// let outcome = session.simu().horizon(6.0).options(SimulateOptions::fast()).call();
/// assert!(outcome.is_completed());
///
/// let outcome = session.simu().mode(RunMode::Continued).horizon(6.0).call();
/// assert!(outcome.is_completed());
/// assert_eq!(session.last_final_time(), 12.0);
/// ```
#[derive(Debug)]
pub struct Session<E: SimulationEngine = Box<dyn SimulationEngine>> {
    engine: E,
    config: SessionConfig,
    application: Application,
    params: ParameterStore,
    states: StateStore,
    figure: Figure,
    result: Option<RunResult>,
    last_final_time: f64,
    phase: RunPhase,
}

impl Session {
    /// Creates a session with an engine of the configured backend around `unit`.
    ///
    /// # Arguments
    ///
    /// * `unit` - The simulation unit to explore
    /// * `config` - Session settings, including the backend to create
    /// * `application` - Parameters, requirements and texts of the unit
    pub fn for_unit(unit: Unit, config: SessionConfig, application: Application) -> Self {
        let engine = engine_for(config.backend, unit);
        Session::new(engine, config, application)
    }
}

#[bon::bon]
impl<E: SimulationEngine> Session<E> {
    /// Creates a session and registers the application's parameters and states.
    ///
    /// Every parameter of `application` is registered under its short name, key
    /// variables are registered for lookup and the engine's states plus the
    /// application's time-discrete states are tracked for continuations.
    ///
    /// # Arguments
    ///
    /// * `engine` - The engine to run simulations with
    /// * `config` - Session settings
    /// * `application` - Parameters, requirements and texts of the unit
    ///
    /// # Returns
    ///
    /// A session in phase [`RunPhase::Ready`], or [`RunPhase::Unconfigured`] if some
    /// parameter has no value yet.
    pub fn new(engine: E, config: SessionConfig, application: Application) -> Self {
        let mut params = ParameterStore::new(config.marker);
        for spec in &application.parameters {
            params.register(&spec.name, &spec.location, spec.value.clone());
        }
        for (name, location) in &application.key_variables {
            params.register_key_variable(name, location);
        }
        for requirement in &application.requirements {
            params.add_requirement(requirement.clone());
        }

        let mut states = StateStore::new(engine.description().state_names());
        for state in &application.time_discrete_states {
            states.track(state);
        }

        let phase = if params.missing().is_empty() {
            RunPhase::Ready
        } else {
            RunPhase::Unconfigured
        };

        Self {
            engine,
            config,
            application,
            params,
            states,
            figure: Figure::default(),
            result: None,
            last_final_time: 0.0,
            phase,
        }
    }

    /// The engine the session runs on.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Settings the session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Application setup of the unit.
    pub fn application(&self) -> &Application {
        &self.application
    }

    /// Registered parameters and their current values.
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Tracked states and the values stored after the last run.
    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// The figure runs are drawn into.
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Result of the last completed run.
    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    /// End time of the last completed run, 0 before the first.
    pub fn last_final_time(&self) -> f64 {
        self.last_final_time
    }

    /// Where the driver stands.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Updates parameters by short name.
    ///
    /// Unknown names and non-numeric values are reported and skipped. Violated
    /// requirements are reported but the values are kept. See
    /// [`ParameterStore::set_parameters`].
    ///
    /// # Arguments
    ///
    /// * `overrides` - Pairs of short name and new value
    ///
    /// # Returns
    ///
    /// A [`Report`] with one issue per problem found. An empty report means every value
    /// was taken.
    pub fn set_parameters<I, K, V>(&mut self, overrides: I) -> Report
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let report = self.params.set_parameters(overrides);
        self.refresh_phase();
        report
    }

    /// Updates initial values.
    ///
    /// Only names carrying the configured initial-value marker are accepted, either as
    /// short name or as model path. See [`ParameterStore::set_initial_values`].
    ///
    /// # Arguments
    ///
    /// * `overrides` - Pairs of name and new value
    ///
    /// # Returns
    ///
    /// A [`Report`] listing names that are not initial values, unknown names and
    /// non-numeric values.
    pub fn set_initial_values<I, K, V>(&mut self, overrides: I) -> Report
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let report = self.params.set_initial_values(overrides);
        self.refresh_phase();
        report
    }

    fn refresh_phase(&mut self) {
        if matches!(self.phase, RunPhase::Unconfigured | RunPhase::Ready) {
            self.phase = if self.params.missing().is_empty() {
                RunPhase::Ready
            } else {
                RunPhase::Unconfigured
            };
        }
    }

    /// Starts a new figure with the given layout.
    ///
    /// The instructions of the layout replace the earlier ones and the style cycle
    /// starts over. Earlier results are not redrawn.
    ///
    /// # Arguments
    ///
    /// * `kind` - The layout, [`PlotLayout::TimeSeries`] if not given
    /// * `title` - Figure title, [`DEFAULT_TITLE`] if not given
    #[builder]
    pub fn declare_plot_layout(
        &mut self,
        #[builder(default)] kind: PlotLayout,
        #[builder(into, default = DEFAULT_TITLE.to_string())] title: String,
    ) {
        self.figure.declare(kind, &title);
    }

    /// Draws the last result again with the current instructions.
    ///
    /// # Returns
    ///
    /// The line style the result was drawn with.
    ///
    /// # Errors
    ///
    /// * [`ExploreError::NoResult`] if no run has completed yet
    /// * [`ExploreError::Presentation`] if a plotted series is not in the result
    pub fn show(&mut self) -> Result<LineStyle, ExploreError> {
        let result = self.result.as_ref().ok_or(ExploreError::NoResult)?;
        Ok(self.figure.render(result)?)
    }

    /// Runs a simulation.
    ///
    /// An `Initial` run resets the engine, applies every parameter and simulates from 0.
    /// A `Continued` run applies the stored final states as initial values and
    /// simulates on from the end of the previous run. After a completed run the result
    /// is drawn, the tracked states are read back and stored through the clamp policy.
    ///
    /// # Arguments
    ///
    /// * `mode` - Kind of run, [`RunMode::Initial`] if not given
    /// * `horizon` - Length of the run, the configured horizon if not given
    /// * `options` - Simulate options, the configured options if not given
    ///
    /// # Returns
    ///
    /// [`RunOutcome::Completed`] with the start and stop time and the style drawn with,
    /// or [`RunOutcome::Aborted`] with the reason. Aborts happen when
    ///
    /// * a parameter has no value ([`ExploreError::ValueMissing`])
    /// * a continuation is requested before any run
    ///   ([`ExploreError::ContinuationBeforeInitial`])
    /// * a tracked state has no initial-value name
    ///   ([`ExploreError::UnsupportedIndexWidth`])
    /// * the engine rejects a value or the integration fails ([`ExploreError::Engine`])
    ///
    /// The engine is not called for the first three.
    #[builder]
    pub fn simu(
        &mut self,
        #[builder(default)] mode: RunMode,
        horizon: Option<f64>,
        options: Option<SimulateOptions>,
    ) -> RunOutcome {
        let horizon = horizon.unwrap_or(self.config.horizon);
        let options = options.unwrap_or_else(|| self.config.options.clone());

        match self.run(mode, horizon, options) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("Simulation aborted: {err}");
                if self.phase == RunPhase::Running {
                    self.phase = RunPhase::Ready;
                }
                RunOutcome::Aborted(err)
            }
        }
    }

    fn run(
        &mut self,
        mode: RunMode,
        horizon: f64,
        mut options: SimulateOptions,
    ) -> Result<RunOutcome, ExploreError> {
        let missing = self.params.missing();
        if !missing.is_empty() {
            self.phase = RunPhase::Unconfigured;
            return Err(ExploreError::ValueMissing(missing));
        }
        self.phase = RunPhase::Ready;

        let (start, overrides) = match mode {
            RunMode::Initial => (0.0, self.initial_overrides()),
            RunMode::Continued => {
                if self.last_final_time == 0.0 {
                    return Err(ExploreError::ContinuationBeforeInitial);
                }
                (self.last_final_time, self.continued_overrides()?)
            }
        };
        let stop = start + horizon;

        if options.outputs.is_none() {
            options.outputs = Some(self.output_filter());
        }

        self.engine.reset();
        for (path, value) in overrides {
            log::debug!("setting {path} = {value}");
            self.engine.set(&path, value)?;
        }

        self.phase = RunPhase::Running;
        log::info!("Simulating {mode} run from {start} to {stop}");
        let result = self.engine.simulate(start, stop, &options)?;

        let style = match self.figure.render(&result) {
            Ok(style) => Some(style),
            Err(err) => {
                log::warn!("Results not drawn: {err}");
                None
            }
        };

        self.store_final_states();
        self.last_final_time = result.final_time().unwrap_or(stop);
        self.result = Some(result);
        self.phase = RunPhase::Completed;

        Ok(RunOutcome::Completed {
            start,
            stop: self.last_final_time,
            style,
        })
    }

    /// Every parameter applied at its model path.
    fn initial_overrides(&self) -> Vec<(String, Value)> {
        self.params
            .entries()
            .iter()
            .filter_map(|e| e.value.clone().map(|v| (e.location.clone(), v)))
            .collect()
    }

    /// Stored states written to their initial values, plus the parameters that are not
    /// initial values of a tracked state.
    fn continued_overrides(&self) -> Result<Vec<(String, Value)>, ExploreError> {
        let marker = self.params.marker();
        let mut remapped = Vec::with_capacity(self.states.len());
        for (state, value) in self.states.iter() {
            let path = initial_value_path(state, marker)?;
            let value = value.ok_or_else(|| ExploreError::ValueMissing(vec![state.to_string()]))?;
            remapped.push((path, Value::Real(value)));
        }

        let mut overrides: Vec<(String, Value)> = self
            .initial_overrides()
            .into_iter()
            .filter(|(location, _)| !remapped.iter().any(|(path, _)| path == location))
            .collect();
        overrides.extend(remapped);
        Ok(overrides)
    }

    /// Variables the engine has to record: plotted series, states and key variables.
    fn output_filter(&self) -> Vec<String> {
        self.figure
            .instructions()
            .iter()
            .flat_map(|i| [i.x.as_str(), i.y.as_str()])
            .filter(|name| *name != TIME)
            .chain(self.states.paths())
            .chain(self.params.key_variables())
            .unique()
            .map(str::to_string)
            .collect()
    }

    fn store_final_states(&mut self) {
        let clamp = self.config.clamp;
        let paths: Vec<String> = self.states.paths().map(str::to_string).collect();
        for path in paths {
            match self.engine.get(&path).map(|v| v.as_f64()) {
                Ok(Some(value)) => self.states.store(&path, clamp.apply(value)),
                Ok(None) => log::warn!("State '{path}' is not numeric"),
                Err(err) => log::warn!("State '{path}' not stored: {err}"),
            }
        }
    }
}
