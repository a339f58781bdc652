//! Values exchanged with a simulation unit.
//!
//! Model variables in a unit are typed as `Real`, `Integer`, `Boolean` or `String`.
//! [`Value`] carries one such value across the engine boundary, and [`ValueMap`]
//! maps model paths to values (used for start values and live instance values).

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Map from model path to value. Ordered so that overrides are applied deterministically.
pub type ValueMap = BTreeMap<String, Value>;

/// A single model value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl Value {
    /// Returns the value as `f64` if it is numeric or boolean.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::String(_) => None,
        }
    }

    /// A value is missing when it is a NaN real or an empty string.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Real(v) => v.is_nan(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Formats the value rounding reals to `decimals` places.
    pub fn rounded(&self, decimals: usize) -> String {
        match self {
            Value::Real(v) => format!("{:.*}", decimals, v),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl FromStr for Value {
    type Err = std::convert::Infallible;

    /// Parses booleans and numbers, anything else is kept as a string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed {
            "true" | "True" => Value::Boolean(true),
            "false" | "False" => Value::Boolean(false),
            _ => match trimmed.parse::<f64>() {
                Ok(v) => Value::Real(v),
                Err(_) => Value::String(trimmed.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse() {
        assert_eq!("2.5".parse::<Value>().unwrap(), Value::Real(2.5));
        assert_eq!("true".parse::<Value>().unwrap(), Value::Boolean(true));
        assert_eq!("abc".parse::<Value>().unwrap(), Value::String("abc".into()));
    }

    #[test]
    fn test_value_missing() {
        assert!(Value::Real(f64::NAN).is_missing());
        assert!(Value::String(String::new()).is_missing());
        assert!(!Value::Real(0.0).is_missing());
        assert!(!Value::Boolean(false).is_missing());
    }

    #[test]
    fn test_value_rounded() {
        assert_eq!(Value::Real(1.23456).rounded(3), "1.235");
        assert_eq!(Value::Boolean(true).rounded(3), "true");
    }
}
