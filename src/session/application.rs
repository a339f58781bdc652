//! Application setup for a unit.
//!
//! An [`Application`] is everything a session knows about a unit beyond its model
//! description: the short parameter names users work with, validity requirements, the
//! key variables worth describing, the broth substances and the descriptive texts.

use std::path::PathBuf;

use derive_builder::Builder;

use crate::unit::{
    value::Value,
    yeast::{MODEL_NAME, SUBSTANCES},
};

use super::{
    naming::InitialValueMarker,
    params::{Comparison, Requirement},
};

/// A broth substance and where its index and molecular weight live in the unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Substance {
    /// Model path of the substance index
    pub index: String,
    /// Model path of the molecular weight
    pub molecular_weight: String,
}

/// A parameter registered under a short name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: String,
    pub value: Option<Value>,
}

impl ParameterSpec {
    fn new(name: String, location: String, value: f64) -> Self {
        Self {
            name,
            location,
            value: Some(Value::Real(value)),
        }
    }
}

/// Everything a session needs to know about a unit that its description does not say.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct Application {
    /// Model the application is written for
    pub model_name: String,
    /// Convention of the initial-value short names
    pub marker: InitialValueMarker,
    /// Strain description for `describe("culture")`
    #[builder(default)]
    pub culture: String,
    #[builder(default)]
    pub broth: Vec<Substance>,
    /// Parameters with their default values, in display order
    #[builder(default)]
    pub parameters: Vec<ParameterSpec>,
    /// (short name, model path) of variables registered for lookup only
    #[builder(default)]
    pub key_variables: Vec<(String, String)>,
    /// Checked each time parameters are set
    #[builder(default)]
    pub requirements: Vec<Requirement>,
    /// Time-discrete states tracked besides the continuous ones
    #[builder(default)]
    pub time_discrete_states: Vec<String>,
    /// Components always listed by `describe("parts")`
    #[builder(default)]
    pub components_minimum: Vec<String>,
    /// Process diagram on disk, used when the unit package has none
    #[builder(default)]
    pub diagram_fallback: Option<PathBuf>,
}

/// Setup of the yeast batch cultivation.
pub fn yeast_batch(marker: InitialValueMarker) -> Application {
    let m = marker.as_str();

    let mut parameters = vec![ParameterSpec::new(
        format!("V{m}"),
        format!("bioreactor.V{m}"),
        4.5,
    )];
    for (i, ((symbol, _, _), start)) in SUBSTANCES.iter().zip([1.0, 10.0, 0.0]).enumerate() {
        parameters.push(ParameterSpec::new(
            format!("V{symbol}{m}"),
            format!("bioreactor.m{m}[{}]", i + 1),
            start,
        ));
    }
    for (name, value) in [("mum", 0.4), ("qGr", 0.5), ("qEr", 0.2), ("qO2lim", 0.010)] {
        parameters.push(ParameterSpec::new(
            name.to_string(),
            format!("bioreactor.culture.{name}"),
            value,
        ));
    }

    let broth = SUBSTANCES
        .iter()
        .enumerate()
        .map(|(i, (symbol, _, _))| Substance {
            index: format!("liquidphase.{symbol}"),
            molecular_weight: format!("liquidphase.mw[{}]", i + 1),
        })
        .collect::<Vec<_>>();

    ApplicationBuilder::default()
        .model_name(MODEL_NAME)
        .marker(marker)
        .culture("Saccharomyces cerevisiae - default parameters for strain H1022")
        .broth(broth)
        .parameters(parameters)
        .key_variables(vec![(
            "mu".to_string(),
            "bioreactor.culture.mu".to_string(),
        )])
        .requirements(vec![
            Requirement::new(format!("V{m}"), Comparison::Greater, 0.0),
            Requirement::new(format!("VX{m}"), Comparison::GreaterOrEqual, 0.0),
            Requirement::new(format!("VG{m}"), Comparison::GreaterOrEqual, 0.0),
        ])
        .components_minimum(vec![
            "bioreactor".to_string(),
            "bioreactor.culture".to_string(),
        ])
        .diagram_fallback(Some(PathBuf::from(
            "BPL_YEAST_COB_Batch_process_diagram_om.png",
        )))
        .build()
        .expect("yeast batch application fields are complete")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yeast_batch_names_follow_marker() {
        let app = yeast_batch(InitialValueMarker::Zero);
        let names: Vec<&str> = app.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["V_0", "VX_0", "VG_0", "VE_0", "mum", "qGr", "qEr", "qO2lim"]
        );
        assert_eq!(app.parameters[2].location, "bioreactor.m_0[2]");
        assert_eq!(app.requirements[0].to_string(), "V_0 > 0");
    }
}
