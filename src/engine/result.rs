//! Run Result Module
//!
//! A [`RunResult`] is the time-indexed table returned by a simulate call. Each recorded
//! variable is stored under its model path; the time axis is stored separately and is
//! also reachable under the key `"time"`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Recorded series, keyed by model path.
pub type TimeSeriesMapping = HashMap<String, Vec<f64>>;

/// Key under which the time axis is exposed.
pub const TIME: &str = "time";

/// Result of one simulate call.
///
/// # Fields
///
/// * `time` - Communication points of the run, from start to stop time
/// * `series` - Recorded values per model path, one value per communication point
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunResult {
    pub time: Vec<f64>,
    pub series: TimeSeriesMapping,
}

impl RunResult {
    /// Creates a result with the given time axis and no recorded series.
    ///
    /// # Arguments
    ///
    /// * `time` - Communication points of the run
    ///
    /// # Returns
    ///
    /// An empty result whose series are added with [`RunResult::add_series`].
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time,
            series: HashMap::new(),
        }
    }

    /// Adds a recorded series.
    ///
    /// # Arguments
    ///
    /// * `name` - Model path of the variable
    /// * `values` - One value per communication point
    pub fn add_series(&mut self, name: String, values: Vec<f64>) {
        self.series.insert(name, values);
    }

    /// Returns the series for `key`, or the time axis for `"time"`.
    pub fn get(&self, key: &str) -> Option<&[f64]> {
        if key == TIME {
            return Some(&self.time);
        }
        self.series.get(key).map(Vec::as_slice)
    }

    /// Whether `key` was recorded. `"time"` always is.
    pub fn contains(&self, key: &str) -> bool {
        key == TIME || self.series.contains_key(key)
    }

    /// Last recorded value of a series.
    pub fn final_value(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|s| s.last().copied())
    }

    /// First recorded value of a series.
    pub fn initial_value(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|s| s.first().copied())
    }

    /// Time the run started at, `None` for an empty result.
    pub fn start_time(&self) -> Option<f64> {
        self.time.first().copied()
    }

    pub fn final_time(&self) -> Option<f64> {
        self.time.last().copied()
    }

    /// Number of communication points.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
