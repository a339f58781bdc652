//! Initial-value naming convention and the state-path rewrite rules.
//!
//! Every continuous state of a unit has a companion parameter holding its value at the
//! start of a run. Depending on the tool that generated the unit, the companion is
//! marked with `_0` or `_start`. Continuation runs seed the next run by writing the last
//! state values into these companions, so a state path has to be rewritten into its
//! initial-value path.
//!
//! The rewrite is a small table of rules, tried in order:
//!
//! | shape of the state path          | initial-value path          |
//! |----------------------------------|-----------------------------|
//! | `owner.<pid>.I.y`                | `owner.I<marker>`           |
//! | `owner.<pid>.D.x`                | `owner.D<marker>`           |
//! | `base[n]` with 1 to 3 digits     | `base<marker>[n]`           |
//! | any other trailing `]`           | unsupported                 |
//! | anything else                    | `path<marker>`              |

use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::error::ExploreError;

/// Marker distinguishing a state's initial value from the state itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialValueMarker {
    /// `_start`, used by units generated with recent tool versions
    #[default]
    Start,
    /// `_0`, the older convention
    Zero,
}

impl InitialValueMarker {
    /// The suffix as it appears in parameter names, `_start` or `_0`.
    pub fn as_str(&self) -> &'static str {
        match self {
            InitialValueMarker::Start => "_start",
            InitialValueMarker::Zero => "_0",
        }
    }

    /// Whether a parameter name follows this convention.
    pub fn marks(&self, name: &str) -> bool {
        name.contains(self.as_str())
    }
}

impl fmt::Display for InitialValueMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single rule.
enum Rewrite {
    /// The initial-value path
    Path(String),
    Unsupported,
}

/// One row of the rewrite table.
struct InitialValueRule {
    name: &'static str,
    pattern: &'static Regex,
    rewrite: fn(&Captures, &str) -> Rewrite,
}

lazy_static! {
    static ref INTEGRATOR_OUTPUT: Regex =
        Regex::new(r"^(?P<owner>(?:.*\.)?)[^.\[\]]+\.I\.y$").expect("valid pattern");
    static ref DERIVATIVE_STATE: Regex =
        Regex::new(r"^(?P<owner>(?:.*\.)?)[^.\[\]]+\.D\.x$").expect("valid pattern");
    static ref SHORT_INDEX: Regex =
        Regex::new(r"^(?P<base>.+?)(?P<index>\[\d{1,3}\])$").expect("valid pattern");
    static ref OTHER_INDEX: Regex = Regex::new(r"\]$").expect("valid pattern");
    static ref PLAIN: Regex = Regex::new(r"^(?P<path>.+)$").expect("valid pattern");
    static ref RULES: Vec<InitialValueRule> = vec![
        InitialValueRule {
            name: "integrator output",
            pattern: &*INTEGRATOR_OUTPUT,
            rewrite: |caps, marker| Rewrite::Path(format!("{}I{marker}", &caps["owner"])),
        },
        InitialValueRule {
            name: "derivative block state",
            pattern: &*DERIVATIVE_STATE,
            rewrite: |caps, marker| Rewrite::Path(format!("{}D{marker}", &caps["owner"])),
        },
        InitialValueRule {
            name: "array element",
            pattern: &*SHORT_INDEX,
            rewrite: |caps, marker| {
                Rewrite::Path(format!("{}{marker}{}", &caps["base"], &caps["index"]))
            },
        },
        InitialValueRule {
            name: "wide array element",
            pattern: &*OTHER_INDEX,
            rewrite: |_, _| Rewrite::Unsupported,
        },
        InitialValueRule {
            name: "plain",
            pattern: &*PLAIN,
            rewrite: |caps, marker| Rewrite::Path(format!("{}{marker}", &caps["path"])),
        },
    ];
}

/// Derives the initial-value path of a state path.
///
/// # Arguments
///
/// * `state` - Path of a continuous state, e.g. `bioreactor.m[2]`
/// * `marker` - Naming convention of the unit
///
/// # Returns
///
/// The path of the parameter holding the state's value at the start of a run.
///
/// # Errors
///
/// Returns [`ExploreError::UnsupportedIndexWidth`] for array indices wider than three
/// digits or multi-dimensional indices.
///
/// # Examples
///
/// ```
/// use fmu_explore::prelude::*;
///
/// let path = initial_value_path("bioreactor.m[2]", InitialValueMarker::Start).unwrap();
/// assert_eq!(path, "bioreactor.m_start[2]");
///
/// let path = initial_value_path("bioreactor.V", InitialValueMarker::Zero).unwrap();
/// assert_eq!(path, "bioreactor.V_0");
///
/// assert!(initial_value_path("x[1000]", InitialValueMarker::Start).is_err());
/// ```
pub fn initial_value_path(
    state: &str,
    marker: InitialValueMarker,
) -> Result<String, ExploreError> {
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(state) {
            log::trace!("rule '{}' matched state '{}'", rule.name, state);
            return match (rule.rewrite)(&caps, marker.as_str()) {
                Rewrite::Path(path) => Ok(path),
                Rewrite::Unsupported => Err(ExploreError::UnsupportedIndexWidth(state.to_string())),
            };
        }
    }

    Err(ExploreError::UnsupportedIndexWidth(state.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrator_output_rule() {
        let path = initial_value_path("PIDreg.limPID.I.y", InitialValueMarker::Start).unwrap();
        assert_eq!(path, "PIDreg.I_start");

        let path = initial_value_path("a.b.PIDreg.limPID.I.y", InitialValueMarker::Zero).unwrap();
        assert_eq!(path, "a.b.PIDreg.I_0");
    }

    #[test]
    fn test_integrator_output_without_owner() {
        let path = initial_value_path("limPID.I.y", InitialValueMarker::Start).unwrap();
        assert_eq!(path, "I_start");
    }

    #[test]
    fn test_derivative_state_rule() {
        let path = initial_value_path("PIDreg.limPID.D.x", InitialValueMarker::Start).unwrap();
        assert_eq!(path, "PIDreg.D_start");
    }

    #[test]
    fn test_array_index_rule() {
        let cases = [
            ("bioreactor.m[1]", "bioreactor.m_start[1]"),
            ("bioreactor.m[12]", "bioreactor.m_start[12]"),
            ("bioreactor.m[999]", "bioreactor.m_start[999]"),
        ];
        for (state, expected) in cases {
            let path = initial_value_path(state, InitialValueMarker::Start).unwrap();
            assert_eq!(path, expected, "Case {state}");
        }

        let path = initial_value_path("bioreactor.m[3]", InitialValueMarker::Zero).unwrap();
        assert_eq!(path, "bioreactor.m_0[3]");
    }

    #[test]
    fn test_wide_index_unsupported() {
        for state in ["x[1000]", "x[1,2]", "x[]"] {
            let result = initial_value_path(state, InitialValueMarker::Start);
            assert!(
                matches!(result, Err(ExploreError::UnsupportedIndexWidth(_))),
                "Case {state} should fail"
            );
        }
    }

    #[test]
    fn test_plain_rule() {
        let path = initial_value_path("bioreactor.V", InitialValueMarker::Start).unwrap();
        assert_eq!(path, "bioreactor.V_start");

        let path = initial_value_path("bioreactor.V", InitialValueMarker::Zero).unwrap();
        assert_eq!(path, "bioreactor.V_0");
    }

    #[test]
    fn test_integrator_rule_ignores_plain_y() {
        // only the `.I.y` shape is an integrator output
        let path = initial_value_path("sensor.y", InitialValueMarker::Start).unwrap();
        assert_eq!(path, "sensor.y_start");
    }

    #[test]
    fn test_marker_matches_names() {
        assert!(InitialValueMarker::Start.marks("VX_start"));
        assert!(!InitialValueMarker::Start.marks("mum"));
        assert!(InitialValueMarker::Zero.marks("V_0"));
    }
}
