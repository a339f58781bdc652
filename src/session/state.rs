//! Last known values of the tracked states.
//!
//! Tracked states are the continuous states the unit declares plus any time-discrete
//! states the application adds. After each run they are read back from the engine and
//! stored here; a continuation run seeds its initial values from this store.

use serde::{Deserialize, Serialize};

/// What to do with a state value read back after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClampPolicy {
    /// Store the value as read
    #[default]
    None,
    /// Floor the value at zero, so that small negative masses from the integrator do
    /// not seed the next run
    NonNegative,
}

impl ClampPolicy {
    /// The value to store for `value`.
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            ClampPolicy::None => value,
            ClampPolicy::NonNegative => value.max(0.0),
        }
    }
}

/// Tracked state paths in registration order, each with its last stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStore {
    states: Vec<(String, Option<f64>)>,
}

impl StateStore {
    /// Tracks `paths`, in order, with no stored value yet.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: paths.into_iter().map(|p| (p.into(), None)).collect(),
        }
    }

    /// Adds a time-discrete state declared by the application.
    pub fn track(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.states.iter().any(|(p, _)| *p == path) {
            self.states.push((path, None));
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(p, _)| p.as_str())
    }

    /// Stored value of `path`, `None` before the first run or if untracked.
    pub fn get(&self, path: &str) -> Option<f64> {
        self.states
            .iter()
            .find(|(p, _)| p == path)
            .and_then(|(_, v)| *v)
    }

    /// Stores a value for a tracked state. Untracked paths are ignored.
    pub fn store(&mut self, path: &str, value: f64) {
        if let Some((_, slot)) = self.states.iter_mut().find(|(p, _)| p == path) {
            *slot = Some(value);
        }
    }

    /// Tracked states with their stored values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.states.iter().map(|(p, v)| (p.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
