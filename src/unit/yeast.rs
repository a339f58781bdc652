//! Built-in yeast batch cultivation unit (`BPL_YEAST_COB.Batch`).
//!
//! The culture follows a constraint-based description of overflow metabolism in
//! *Saccharomyces cerevisiae*. Glucose is taken up with Monod kinetics. Respiration of
//! glucose is bounded both by the respiratory capacity `qGr` and by the oxygen uptake
//! limit `qO2lim`; glucose taken up beyond that bound is fermented to ethanol. Ethanol
//! is respired with the oxygen capacity left over, repressed by glucose. The resulting
//! specific growth rate is capped at `mum` by scaling all fluxes.
//!
//! The reactor is a batch vessel with states `bioreactor.V` and the masses
//! `bioreactor.m[1..3]` of cells (X), glucose (G) and ethanol (E).

use std::sync::Arc;

use crate::{
    engine::error::EngineError,
    session::naming::InitialValueMarker,
};

use super::{
    description::{
        Causality, ModelDescription, ModelDescriptionBuilder, ModelVariable,
        ModelVariableBuilder, UnitKind, Variability, VariableType,
    },
    dynamics::{BoundSystem, Dynamics, Unit},
    value::{Value, ValueMap},
};

/// Model name the yeast batch dynamics are registered under.
pub const MODEL_NAME: &str = "BPL_YEAST_COB.Batch";

/// Library versions recorded as local constants of the unit.
pub const MSL_USAGE: &str = "4.1.0 - used components: RealInput, RealOutput";
pub const MSL_VERSION: &str = "4.1.0";
pub const BPL_VERSION: &str = "Bioprocess Library version 2.3.1";

/// Substances of the broth: (short name, description, molecular weight in Da).
pub const SUBSTANCES: [(&str, &str, f64); 3] = [
    ("X", "Cell concentration", 24.6),
    ("G", "Substrate glucose concentration", 180.0),
    ("E", "Ethanol concentration", 46.0),
];

/// Creates the yeast batch unit using `marker` for its initial-value parameters.
pub fn yeast_batch_unit(marker: InitialValueMarker) -> Unit {
    let description = yeast_batch_description(marker);
    Unit::new(description, Arc::new(YeastBatch::new(marker)))
        .expect("built-in description and dynamics share the model name")
}

/// Culture parameter defaults: (path suffix, description, unit, value).
const CULTURE_PARAMETERS: [(&str, &str, &str, f64); 12] = [
    ("mum", "Maximal specific growth rate", "1/h", 0.4),
    ("qGmax", "Maximal specific glucose uptake rate", "g/(g*h)", 2.5),
    ("kG", "Glucose half saturation constant", "g/L", 0.1),
    ("qGr", "Respiratory capacity for glucose", "g/(g*h)", 0.5),
    ("qEr", "Respiratory capacity for ethanol", "g/(g*h)", 0.2),
    ("kE", "Ethanol half saturation constant", "g/L", 0.1),
    ("kiG", "Glucose repression constant for ethanol uptake", "g/L", 0.02),
    ("qO2lim", "Oxygen uptake capacity", "mole/(g*h)", 0.010),
    ("YXGr", "Cell yield on respired glucose", "g/g", 0.5),
    ("YXGf", "Cell yield on fermented glucose", "g/g", 0.05),
    ("YEGf", "Ethanol yield on fermented glucose", "g/g", 0.45),
    ("YXEr", "Cell yield on respired ethanol", "g/g", 0.6),
];

/// Oxygen demand per respired substrate: (path suffix, description, value in mole/g).
const OXYGEN_DEMAND: [(&str, &str, f64); 2] = [
    ("aO2G", "Oxygen demand per respired glucose", 0.017),
    ("aO2E", "Oxygen demand per respired ethanol", 0.040),
];

const INITIAL_VOLUME: f64 = 4.5;
const INITIAL_MASSES: [f64; 3] = [1.0, 10.0, 0.0];

fn parameter(name: String, description: &str, unit: &str, start: f64) -> ModelVariable {
    ModelVariableBuilder::default()
        .name(name)
        .description(description)
        .unit(Some(unit.to_string()))
        .causality(Causality::Parameter)
        .variability(Variability::Fixed)
        .start(Some(Value::Real(start)))
        .build()
        .expect("parameter fields are complete")
}

fn continuous(name: String, description: &str, unit: &str) -> ModelVariable {
    ModelVariableBuilder::default()
        .name(name)
        .description(description)
        .unit(Some(unit.to_string()))
        .build()
        .expect("variable fields are complete")
}

fn derivative(state: &str, unit: &str) -> ModelVariable {
    ModelVariableBuilder::default()
        .name(format!("der({state})"))
        .unit(Some(unit.to_string()))
        .derivative(Some(state.to_string()))
        .build()
        .expect("derivative fields are complete")
}

fn constant(name: &str, description: &str, var_type: VariableType, start: Value) -> ModelVariable {
    ModelVariableBuilder::default()
        .name(name)
        .description(description)
        .variability(Variability::Constant)
        .var_type(var_type)
        .start(Some(start))
        .build()
        .expect("constant fields are complete")
}

/// Variable directory of the yeast batch unit.
pub fn yeast_batch_description(marker: InitialValueMarker) -> ModelDescription {
    let m = marker.as_str();
    let mut variables = vec![
        parameter(
            format!("bioreactor.V{m}"),
            "Initial broth volume",
            "L",
            INITIAL_VOLUME,
        ),
        continuous("bioreactor.V".to_string(), "Broth volume", "L"),
        derivative("bioreactor.V", "L/h"),
    ];

    for (i, ((symbol, name, _), start)) in SUBSTANCES.iter().zip(INITIAL_MASSES).enumerate() {
        let index = i + 1;
        variables.push(parameter(
            format!("bioreactor.m{m}[{index}]"),
            &format!("Initial mass of {symbol}"),
            "g",
            start,
        ));
        variables.push(continuous(
            format!("bioreactor.m[{index}]"),
            &format!("Mass of {symbol}"),
            "g",
        ));
        variables.push(derivative(&format!("bioreactor.m[{index}]"), "g/h"));
        variables.push(continuous(format!("bioreactor.c[{index}]"), name, "g/L"));
        variables.push(continuous(
            format!("bioreactor.culture.q[{index}]"),
            &format!("Specific rate of {symbol}"),
            "g/(g*h)",
        ));
        variables.push(constant(
            &format!("liquidphase.{symbol}"),
            name,
            VariableType::Integer,
            Value::Integer(index as i64),
        ));
        variables.push(
            ModelVariableBuilder::default()
                .name(format!("liquidphase.mw[{index}]"))
                .description(format!("Molecular weight of {symbol}"))
                .unit(Some("Da".to_string()))
                .variability(Variability::Constant)
                .start(Some(Value::Real(SUBSTANCES[i].2)))
                .build()
                .expect("constant fields are complete"),
        );
    }

    for (suffix, description, unit, start) in CULTURE_PARAMETERS {
        variables.push(parameter(
            format!("bioreactor.culture.{suffix}"),
            description,
            unit,
            start,
        ));
    }
    for (suffix, description, start) in OXYGEN_DEMAND {
        variables.push(parameter(
            format!("bioreactor.culture.{suffix}"),
            description,
            "mole/g",
            start,
        ));
    }

    variables.push(continuous(
        "bioreactor.culture.mu".to_string(),
        "Specific growth rate",
        "1/h",
    ));
    variables.push(continuous(
        "bioreactor.culture.qO2".to_string(),
        "Specific oxygen uptake rate",
        "mole/(g*h)",
    ));

    variables.push(constant(
        "MSL.usage",
        "Modelica Standard Library usage",
        VariableType::String,
        Value::from(MSL_USAGE),
    ));
    variables.push(constant(
        "MSL.version",
        "Modelica Standard Library version",
        VariableType::String,
        Value::from(MSL_VERSION),
    ));
    variables.push(constant(
        "BPL.version",
        "Bioprocess Library version",
        VariableType::String,
        Value::from(BPL_VERSION),
    ));

    ModelDescriptionBuilder::default()
        .model_name(MODEL_NAME)
        .generation_tool(format!("fmu-explore {}", env!("CARGO_PKG_VERSION")))
        .generation_date_and_time("2025-11-08T00:00:00Z")
        .kind(UnitKind::ModelExchange)
        .variables(variables)
        .build()
        .expect("description fields are complete")
}

/// Dynamics of the yeast batch cultivation.
#[derive(Debug, Clone)]
pub struct YeastBatch {
    marker: InitialValueMarker,
    states: Vec<String>,
}

impl YeastBatch {
    /// Dynamics whose initial-value parameters follow `marker`.
    pub fn new(marker: InitialValueMarker) -> Self {
        Self {
            marker,
            states: vec![
                "bioreactor.V".to_string(),
                "bioreactor.m[1]".to_string(),
                "bioreactor.m[2]".to_string(),
                "bioreactor.m[3]".to_string(),
            ],
        }
    }
}

fn real(values: &ValueMap, path: &str) -> Result<f64, EngineError> {
    values
        .get(path)
        .filter(|v| !v.is_missing())
        .and_then(Value::as_f64)
        .ok_or_else(|| EngineError::MissingStartValue(path.to_string()))
}

impl Dynamics for YeastBatch {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn bind(&self, values: &ValueMap) -> Result<Box<dyn BoundSystem>, EngineError> {
        let m = self.marker.as_str();
        let culture = |name: &str| real(values, &format!("bioreactor.culture.{name}"));

        let initial = vec![
            real(values, &format!("bioreactor.V{m}"))?,
            real(values, &format!("bioreactor.m{m}[1]"))?,
            real(values, &format!("bioreactor.m{m}[2]"))?,
            real(values, &format!("bioreactor.m{m}[3]"))?,
        ];

        Ok(Box::new(BoundYeastBatch {
            states: self.states.clone(),
            initial,
            culture: Culture {
                mum: culture("mum")?,
                q_g_max: culture("qGmax")?,
                k_g: culture("kG")?,
                q_gr: culture("qGr")?,
                q_er: culture("qEr")?,
                k_e: culture("kE")?,
                ki_g: culture("kiG")?,
                q_o2_lim: culture("qO2lim")?,
                y_x_gr: culture("YXGr")?,
                y_x_gf: culture("YXGf")?,
                y_e_gf: culture("YEGf")?,
                y_x_er: culture("YXEr")?,
                a_o2_g: culture("aO2G")?,
                a_o2_e: culture("aO2E")?,
            },
        }))
    }
}

#[derive(Debug, Clone, Copy)]
struct Culture {
    mum: f64,
    q_g_max: f64,
    k_g: f64,
    q_gr: f64,
    q_er: f64,
    k_e: f64,
    ki_g: f64,
    q_o2_lim: f64,
    y_x_gr: f64,
    y_x_gf: f64,
    y_e_gf: f64,
    y_x_er: f64,
    a_o2_g: f64,
    a_o2_e: f64,
}

/// Specific fluxes of the culture at one broth composition.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fluxes {
    glucose_respired: f64,
    glucose_fermented: f64,
    ethanol_respired: f64,
    mu: f64,
    oxygen: f64,
}

impl Culture {
    fn fluxes(&self, glucose: f64, ethanol: f64) -> Fluxes {
        let glucose = glucose.max(0.0);
        let ethanol = ethanol.max(0.0);

        let uptake = self.q_g_max * glucose / (self.k_g + glucose);
        let respired = uptake.min(self.q_gr).min(self.q_o2_lim / self.a_o2_g);
        let fermented = uptake - respired;

        let oxygen_left = (self.q_o2_lim - self.a_o2_g * respired).max(0.0);
        let ethanol_respired = (self.q_er * ethanol / (self.k_e + ethanol)
            * self.ki_g
            / (self.ki_g + glucose))
            .min(oxygen_left / self.a_o2_e);

        let mu = self.y_x_gr * respired + self.y_x_gf * fermented + self.y_x_er * ethanol_respired;
        let scale = if mu > self.mum { self.mum / mu } else { 1.0 };

        let glucose_respired = scale * respired;
        let ethanol_respired = scale * ethanol_respired;
        Fluxes {
            glucose_respired,
            glucose_fermented: scale * fermented,
            ethanol_respired,
            mu: scale * mu,
            oxygen: self.a_o2_g * glucose_respired + self.a_o2_e * ethanol_respired,
        }
    }

    /// Net specific rates of X, G and E in g/(g*h).
    fn rates(&self, fluxes: &Fluxes) -> [f64; 3] {
        [
            fluxes.mu,
            -(fluxes.glucose_respired + fluxes.glucose_fermented),
            self.y_e_gf * fluxes.glucose_fermented - fluxes.ethanol_respired,
        ]
    }
}

struct BoundYeastBatch {
    states: Vec<String>,
    initial: Vec<f64>,
    culture: Culture,
}

impl BoundYeastBatch {
    fn concentrations(y: &[f64]) -> [f64; 3] {
        let volume = y[0];
        [y[1] / volume, y[2] / volume, y[3] / volume]
    }
}

impl BoundSystem for BoundYeastBatch {
    fn state_names(&self) -> &[String] {
        &self.states
    }

    fn initial_state(&self) -> Vec<f64> {
        self.initial.clone()
    }

    fn rhs(&self, _t: f64, y: &[f64], dy: &mut [f64]) {
        let c = Self::concentrations(y);
        let fluxes = self.culture.fluxes(c[1], c[2]);
        let q = self.culture.rates(&fluxes);
        let cells = y[1].max(0.0);

        dy[0] = 0.0;
        for i in 0..3 {
            dy[i + 1] = q[i] * cells;
        }
    }

    fn outputs(&self, _t: f64, y: &[f64]) -> Vec<(String, f64)> {
        let c = Self::concentrations(y);
        let fluxes = self.culture.fluxes(c[1], c[2]);
        let q = self.culture.rates(&fluxes);

        let mut outputs = Vec::with_capacity(8);
        for i in 0..3 {
            outputs.push((format!("bioreactor.c[{}]", i + 1), c[i]));
            outputs.push((format!("bioreactor.culture.q[{}]", i + 1), q[i]));
        }
        outputs.push(("bioreactor.culture.mu".to_string(), fluxes.mu));
        outputs.push(("bioreactor.culture.qO2".to_string(), fluxes.oxygen));
        outputs
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn culture() -> Culture {
        let unit = yeast_batch_unit(InitialValueMarker::Start);
        let values = unit.merged_values(&ValueMap::new());
        let m = |name: &str| real(&values, &format!("bioreactor.culture.{name}")).unwrap();
        Culture {
            mum: m("mum"),
            q_g_max: m("qGmax"),
            k_g: m("kG"),
            q_gr: m("qGr"),
            q_er: m("qEr"),
            k_e: m("kE"),
            ki_g: m("kiG"),
            q_o2_lim: m("qO2lim"),
            y_x_gr: m("YXGr"),
            y_x_gf: m("YXGf"),
            y_e_gf: m("YEGf"),
            y_x_er: m("YXEr"),
            a_o2_g: m("aO2G"),
            a_o2_e: m("aO2E"),
        }
    }

    #[test]
    fn test_description_declares_states_through_derivatives() {
        let description = yeast_batch_description(InitialValueMarker::Start);
        assert_eq!(
            description.state_names(),
            vec![
                "bioreactor.V",
                "bioreactor.m[1]",
                "bioreactor.m[2]",
                "bioreactor.m[3]"
            ]
        );
    }

    #[test]
    fn test_description_uses_marker() {
        let zero = yeast_batch_description(InitialValueMarker::Zero);
        assert!(zero.variable("bioreactor.V_0").is_some());
        assert!(zero.variable("bioreactor.m_0[2]").is_some());
        assert!(zero.variable("bioreactor.V_start").is_none());
    }

    #[test]
    fn test_overflow_at_high_glucose() {
        let fluxes = culture().fluxes(20.0, 0.0);
        assert!(fluxes.glucose_fermented > 0.0);
        assert_relative_eq!(fluxes.glucose_respired, 0.5);
        assert_relative_eq!(fluxes.ethanol_respired, 0.0);
    }

    #[test]
    fn test_ethanol_respired_without_glucose() {
        let fluxes = culture().fluxes(0.0, 2.0);
        assert_relative_eq!(fluxes.glucose_fermented, 0.0);
        assert!(fluxes.ethanol_respired > 0.0);
        assert!(fluxes.oxygen <= 0.010 + 1e-12);
    }

    #[test]
    fn test_growth_rate_capped_at_mum() {
        let mut culture = culture();
        culture.mum = 0.1;
        let fluxes = culture.fluxes(20.0, 0.0);
        assert_relative_eq!(fluxes.mu, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_bind_reports_missing_start() {
        let unit = yeast_batch_unit(InitialValueMarker::Start);
        let mut values = unit.merged_values(&ValueMap::new());
        values.remove("bioreactor.culture.mum");
        let err = unit.dynamics().bind(&values).err().unwrap();
        assert!(matches!(err, EngineError::MissingStartValue(path) if path == "bioreactor.culture.mum"));
    }
}
