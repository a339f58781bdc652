//! Session configuration.
//!
//! The two engine backends ship with different presets: the persistent instance uses the
//! `_0` naming convention and floors states at zero, the one-shot engine uses `_start`
//! and keeps raw values.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    engine::{options::SimulateOptions, traits::Backend},
    io::IOError,
};

use super::{naming::InitialValueMarker, state::ClampPolicy};

/// Configuration of an exploration session
///
/// # Examples
///
/// ```
/// use fmu_explore::prelude::*;
///
/// let config = SessionConfigBuilder::default()
///     .horizon(24.0)
///     .options(SimulateOptions::fast())
///     .build()
///     .unwrap();
/// assert_eq!(config.marker, InitialValueMarker::Start);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Default simulation horizon in hours
    #[builder(default = "12.0")]
    pub horizon: f64,
    #[builder(default)]
    pub options: SimulateOptions,
    /// Engine created by [`Session::for_unit`](crate::session::Session::for_unit)
    #[builder(default)]
    pub backend: Backend,
    /// Naming convention of initial values
    #[builder(default)]
    pub marker: InitialValueMarker,
    /// Applied to states read back after a run
    #[builder(default)]
    pub clamp: ClampPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_backend(Backend::default())
    }
}

impl SessionConfig {
    /// Preset for a backend.
    pub fn for_backend(backend: Backend) -> Self {
        let (marker, clamp) = match backend {
            Backend::Instance => (InitialValueMarker::Zero, ClampPolicy::NonNegative),
            Backend::OneShot => (InitialValueMarker::Start, ClampPolicy::None),
        };

        Self {
            horizon: 12.0,
            options: SimulateOptions::standard(),
            backend,
            marker,
            clamp,
        }
    }

    /// Reads a configuration from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// * The file cannot be opened (`IOError::FileNotFound`)
    /// * The contents are not a valid configuration (`IOError::JsonParseError`)
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, IOError> {
        let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
        serde_json::from_reader(file).map_err(IOError::JsonParseError)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_presets() {
        let instance = SessionConfig::for_backend(Backend::Instance);
        assert_eq!(instance.marker, InitialValueMarker::Zero);
        assert_eq!(instance.clamp, ClampPolicy::NonNegative);

        let oneshot = SessionConfig::for_backend(Backend::OneShot);
        assert_eq!(oneshot.marker, InitialValueMarker::Start);
        assert_eq!(oneshot.clamp, ClampPolicy::None);
        assert_eq!(oneshot.horizon, 12.0);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"horizon": 6.0, "options": {{"ncp": 100, "substeps": 2, "solver": "RK5"}}}}"#).unwrap();

        let config = SessionConfig::from_json(file.path()).unwrap();
        assert_eq!(config.horizon, 6.0);
        assert_eq!(config.options.ncp, 100);
        assert_eq!(config.marker, InitialValueMarker::Start);
    }
}
