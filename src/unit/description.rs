//! Model description of a simulation unit
//!
//! The model description is the read-only variable directory a unit declares: every
//! variable with its description, unit, causality, variability, type and declared start
//! value. Derivative variables link back to the state they differentiate, which is how
//! the list of continuous states is derived.
//!
//! Descriptions are serialised as `modelDescription.json` inside a unit package.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::value::{Value, ValueMap};

/// Kind of simulation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Model exchange: the importing tool integrates the equations
    ModelExchange,
    /// Co-simulation: the unit carries its own solver
    CoSimulation,
}

impl UnitKind {
    /// Short form used in system information listings.
    pub fn short(&self) -> &'static str {
        match self {
            UnitKind::ModelExchange => "ME",
            UnitKind::CoSimulation => "CS",
        }
    }
}

/// Causality of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Causality {
    Parameter,
    CalculatedParameter,
    Input,
    Output,
    Local,
    Independent,
}

/// Variability of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Variability {
    Constant,
    Fixed,
    Tunable,
    Discrete,
    Continuous,
}

/// Declared type of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Real,
    Integer,
    Boolean,
    String,
}

/// A single entry of the variable directory.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(setter(into))]
pub struct ModelVariable {
    /// Full model path, e.g. `bioreactor.culture.qGr`
    pub name: String,
    /// Human-readable description shown by `describe`
    #[builder(default)]
    #[serde(default)]
    pub description: String,
    /// Physical unit, e.g. `g/L`
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[builder(default = "Causality::Local")]
    pub causality: Causality,
    #[builder(default = "Variability::Continuous")]
    pub variability: Variability,
    #[builder(default = "VariableType::Real")]
    #[serde(rename = "type")]
    pub var_type: VariableType,
    /// Declared start value
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,
    /// Set on derivative variables: the name of the state this variable differentiates
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivative: Option<String>,
}

impl ModelVariable {
    /// Whether an importer may set this variable before a run.
    pub fn is_settable(&self) -> bool {
        matches!(self.causality, Causality::Parameter | Causality::Input)
            || (self.variability != Variability::Constant && self.start.is_some())
    }

    /// Whether the declared start value is the value for the whole run.
    pub fn is_time_invariant(&self) -> bool {
        matches!(self.variability, Variability::Constant | Variability::Fixed)
    }
}

/// The variable directory and header information of a unit.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(setter(into))]
pub struct ModelDescription {
    /// Name the dynamics are looked up by
    pub model_name: String,
    #[builder(default = "\"2.0\".to_string()")]
    pub fmi_version: String,
    #[builder(default)]
    pub generation_tool: String,
    /// As written by the generating tool, not parsed
    #[builder(default)]
    pub generation_date_and_time: String,
    #[builder(default = "UnitKind::ModelExchange")]
    pub kind: UnitKind,
    /// Variable directory in declaration order
    #[builder(default)]
    pub variables: Vec<ModelVariable>,
}

impl ModelDescription {
    /// Looks up a variable by its exact model path.
    pub fn variable(&self, name: &str) -> Option<&ModelVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Looks up a variable by exact path, falling back to the first variable whose path
    /// contains `name`.
    pub fn find_variable(&self, name: &str) -> Option<&ModelVariable> {
        self.variable(name)
            .or_else(|| self.variables.iter().find(|v| v.name.contains(name)))
    }

    /// Names of the continuous states, in declaration order of their derivatives.
    pub fn state_names(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter_map(|v| v.derivative.clone())
            .collect()
    }

    /// Declared start values of every variable that has one.
    pub fn start_values(&self) -> ValueMap {
        self.variables
            .iter()
            .filter_map(|v| v.start.clone().map(|s| (v.name.clone(), s)))
            .collect()
    }

    /// Variables with a given causality.
    pub fn with_causality(&self, causality: Causality) -> impl Iterator<Item = &ModelVariable> {
        self.variables
            .iter()
            .filter(move |v| v.causality == causality)
    }

    /// Returns the declared start of a `local` constant whose path contains `pattern`.
    ///
    /// Library version strings are stored this way (`MSL.version`, `BPL.version`).
    pub fn local_constant(&self, pattern: &str) -> Option<&Value> {
        self.with_causality(Causality::Local)
            .find(|v| v.name.contains(pattern))
            .and_then(|v| v.start.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> ModelDescription {
        ModelDescriptionBuilder::default()
            .model_name("test")
            .variables(vec![
                ModelVariableBuilder::default()
                    .name("x")
                    .build()
                    .unwrap(),
                ModelVariableBuilder::default()
                    .name("der(x)")
                    .derivative(Some("x".to_string()))
                    .build()
                    .unwrap(),
                ModelVariableBuilder::default()
                    .name("x_start")
                    .causality(Causality::Parameter)
                    .variability(Variability::Fixed)
                    .start(Some(Value::Real(1.0)))
                    .build()
                    .unwrap(),
                ModelVariableBuilder::default()
                    .name("BPL.version")
                    .var_type(VariableType::String)
                    .variability(Variability::Constant)
                    .start(Some(Value::from("2.3.1")))
                    .build()
                    .unwrap(),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn test_state_names() {
        assert_eq!(description().state_names(), vec!["x".to_string()]);
    }

    #[test]
    fn test_find_variable_falls_back_to_contains() {
        let desc = description();
        assert_eq!(desc.find_variable("x_st").unwrap().name, "x_start");
        assert!(desc.find_variable("nothing").is_none());
    }

    #[test]
    fn test_local_constant() {
        let desc = description();
        assert_eq!(desc.local_constant("BPL.version"), Some(&Value::from("2.3.1")));
    }

    #[test]
    fn test_description_json_roundtrip_keeps_type_field() {
        let json = serde_json::to_string(&description()).unwrap();
        assert!(json.contains("\"type\":\"Real\""));
        let back: ModelDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, description());
    }
}
