//! Information display for an exploration session
//!
//! Helpers that describe the loaded unit and the session state in a human-readable
//! form: single variables and parameters, the broth, the model's components, the
//! parameter table and system information. Values are read through the engine, so they
//! reflect the last simulation.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use itertools::Itertools;
use tabled::{builder::Builder, settings::Style};

use crate::{
    engine::{error::EngineError, traits::SimulationEngine},
    session::{driver::Session, error::ExploreError},
    unit::{description::ModelDescription, value::Value},
};

/// Names that are never listed as components.
const HIDDEN_COMPONENTS: &[&str] = &["", "der", "BPL", "Customer"];

/// Layout of the parameter table printed by [`disp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispMode {
    /// Name and value
    #[default]
    Short,
    /// Model path, name and value
    Long,
}

impl FromStr for DispMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(DispMode::Short),
            "long" | "location" => Ok(DispMode::Long),
            _ => Err(format!("Unknown display mode '{s}', expected 'short' or 'long'")),
        }
    }
}

/// Describes the culture, the broth, the model parts, the library versions, time, or a
/// single parameter or variable.
///
/// Names are looked up among the registered short names first and are otherwise taken as
/// model paths.
///
/// # Arguments
///
/// * `session` - The session whose engine the values are read from
/// * `name` - One of `culture`, `broth`, `parts`, `MSL` or `time`, a registered short
///   name or a model path
/// * `decimals` - Number of decimals values are rounded to
///
/// # Returns
///
/// A line of the form `description : value [ unit ]` for parameters and variables, or
/// the text of the named topic. A value the engine cannot provide is shown as `-`.
///
/// # Errors
///
/// Returns [`ExploreError::Engine`] if `name` is neither a topic nor a known variable.
///
/// # Examples
///
/// ```
/// use fmu_explore::prelude::*;
///
/// let config = SessionConfig::for_backend(Backend::OneShot);
/// let application = yeast_batch(config.marker);
/// let session = Session::for_unit(yeast_batch_unit(config.marker), config, application);
///
/// assert_eq!(describe(&session, "time", 3).unwrap(), "Time [ h ]");
/// assert!(describe(&session, "nonsense", 3).is_err());
/// ```
pub fn describe<E: SimulationEngine>(
    session: &Session<E>,
    name: &str,
    decimals: usize,
) -> Result<String, ExploreError> {
    let description = session.engine().description();
    match name {
        "culture" => Ok(session.application().culture.clone()),
        "broth" | "liquidphase" | "media" => Ok(describe_broth(session)),
        "parts" => Ok(format!(
            "{:?}",
            describe_parts(description, &session.application().components_minimum)
        )),
        "MSL" => Ok(format!(
            "MSL: {}",
            description
                .local_constant("MSL.usage")
                .map(Value::to_string)
                .unwrap_or_default()
        )),
        "time" => Ok("Time [ h ]".to_string()),
        _ => describe_general(session, name, decimals),
    }
}

fn describe_broth<E: SimulationEngine>(session: &Session<E>) -> String {
    let description = session.engine().description();
    let declared = |path: &str| {
        description
            .variable(path)
            .and_then(|v| v.start.as_ref())
            .map(Value::to_string)
            .unwrap_or_default()
    };

    let mut builder = Builder::default();
    builder.push_record(["Substance", "Index", "Molecular weight [Da]"]);
    for substance in &session.application().broth {
        let name = description
            .variable(&substance.index)
            .map(|v| v.description.clone())
            .unwrap_or_else(|| substance.index.clone());
        builder.push_record([
            name,
            declared(&substance.index),
            declared(&substance.molecular_weight),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    format!("Reactor broth substances included in the model\n\n{table}")
}

fn describe_general<E: SimulationEngine>(
    session: &Session<E>,
    name: &str,
    decimals: usize,
) -> Result<String, ExploreError> {
    let location = session.params().location(name).unwrap_or(name);
    let variable = session
        .engine()
        .description()
        .variable(location)
        .ok_or_else(|| EngineError::UnknownVariable(location.to_string()))?;

    let value = match session.engine().get(location) {
        Ok(value) => value.rounded(decimals),
        Err(err) => {
            log::warn!("{err}");
            "-".to_string()
        }
    };

    Ok(match &variable.unit {
        Some(unit) if !unit.is_empty() => {
            format!("{} : {} [ {} ]", variable.description, value, unit)
        }
        _ => format!("{} : {}", variable.description, value),
    })
}

/// Top-level components of the model, merged with `minimum` and sorted ignoring case.
pub fn describe_parts(description: &ModelDescription, minimum: &[String]) -> Vec<String> {
    description
        .variables
        .iter()
        .map(|v| component(&v.name))
        .filter(|c| !HIDDEN_COMPONENTS.contains(c))
        .map(str::to_string)
        .chain(minimum.iter().cloned())
        .unique()
        .sorted_by_key(|c| c.to_lowercase())
        .collect()
}

/// Leading path segment of a variable name, up to the first `.` or `(`.
fn component(name: &str) -> &str {
    if name.starts_with('_') {
        return "";
    }
    let end = name.find(['.', '(']).unwrap_or(name.len());
    &name[..end]
}

/// Table of registered parameters whose model path contains `name`. If no path
/// matches, parameters whose short name contains `name` are listed instead.
///
/// # Arguments
///
/// * `session` - The session whose parameters are listed
/// * `name` - Substring to match, an empty string lists everything
/// * `decimals` - Number of decimals values are rounded to
/// * `mode` - Whether the model path is shown as well
///
/// # Returns
///
/// The rendered table. Values come from the engine, so after a run they show the
/// current state rather than what was set.
pub fn disp<E: SimulationEngine>(
    session: &Session<E>,
    name: &str,
    decimals: usize,
    mode: DispMode,
) -> String {
    let entries = session.params().entries();
    let mut selected: Vec<_> = entries
        .iter()
        .filter(|e| e.location.contains(name))
        .collect();
    if selected.is_empty() {
        selected = entries.iter().filter(|e| e.name.contains(name)).collect();
    }

    let mut builder = Builder::default();
    match mode {
        DispMode::Short => builder.push_record(["Name", "Value"]),
        DispMode::Long => builder.push_record(["Location", "Name", "Value"]),
    }

    for entry in selected {
        let value = match session.engine().get(&entry.location) {
            Ok(value) => value.rounded(decimals),
            Err(err) => {
                log::warn!("{err}");
                "-".to_string()
            }
        };
        match mode {
            DispMode::Short => builder.push_record([entry.name.clone(), value]),
            DispMode::Long => {
                builder.push_record([entry.location.clone(), entry.name.clone(), value])
            }
        }
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Key facts about the platform, the engine and the loaded unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemInfo {
    /// Operating system family
    pub os: String,
    /// Version of this crate
    pub crate_version: String,
    /// Engine backend in use
    pub engine: String,
    /// Tool that generated the unit
    pub generation_tool: String,
    pub fmi_version: String,
    /// `ME` or `CS`
    pub kind: String,
    pub model_name: String,
    /// Generation date of the unit
    pub generated: String,
    /// Modelica Standard Library version the unit was built with
    pub msl_version: String,
    /// Bioprocess library version
    pub description: String,
    /// How the unit is driven
    pub interaction: String,
}

/// Collects [`SystemInfo`] for a session.
pub fn system_info<E: SimulationEngine>(session: &Session<E>) -> SystemInfo {
    let description = session.engine().description();
    let constant = |pattern: &str| {
        description
            .local_constant(pattern)
            .map(Value::to_string)
            .unwrap_or_default()
    };

    SystemInfo {
        os: std::env::consts::OS.to_string(),
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
        engine: session.engine().backend().to_string(),
        generation_tool: description.generation_tool.clone(),
        fmi_version: description.fmi_version.clone(),
        kind: description.kind.short().to_string(),
        model_name: description.model_name.clone(),
        generated: description.generation_date_and_time.clone(),
        msl_version: constant("MSL.version"),
        description: constant("BPL.version"),
        interaction: format!(
            "fmu-explore for the {} engine version {}",
            session.engine().backend(),
            env!("CARGO_PKG_VERSION")
        ),
    }
}

impl Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System information")?;
        writeln!(f, " -OS: {}", self.os)?;
        writeln!(f, " -fmu-explore: {}", self.crate_version)?;
        writeln!(f, " -Engine: {}", self.engine)?;
        writeln!(f, " -Unit by: {}", self.generation_tool)?;
        writeln!(f, " -FMI: {}", self.fmi_version)?;
        writeln!(f, " -Type: {}", self.kind)?;
        writeln!(f, " -Name: {}", self.model_name)?;
        writeln!(f, " -Generated: {}", self.generated)?;
        writeln!(f, " -MSL: {}", self.msl_version)?;
        writeln!(f, " -Description: {}", self.description)?;
        write!(f, " -Interaction: {}", self.interaction)
    }
}

/// Overview of the key commands.
pub fn command_overview() -> String {
    [
        "Model for the process has been setup. Key commands:",
        " - run --set NAME=VALUE     - change of parameters and initial values, then simulate",
        " - run --init NAME=VALUE    - change initial values only",
        " - run --continue HORIZON   - continue from the final state of the previous run",
        " - run --layout LAYOUT      - make a new plot",
        " - disp [NAME]              - display parameters and initial values",
        " - describe NAME            - describe culture, broth, parameters, variables with values/units",
        " - diagram                  - extract the process diagram",
        " - export-unit DIR          - write the unit package",
        "",
        "Note that both disp and describe take values from the last simulation.",
        "Key system information is listed with the command info.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{options::SimulateOptions, traits::Backend},
        session::{application::yeast_batch, config::SessionConfig},
        unit::yeast::yeast_batch_unit,
    };

    fn session(backend: Backend) -> Session {
        let config = SessionConfig::for_backend(backend);
        let application = yeast_batch(config.marker);
        Session::for_unit(yeast_batch_unit(config.marker), config, application)
    }

    #[test]
    fn test_component() {
        assert_eq!(component("bioreactor.culture.mum"), "bioreactor");
        assert_eq!(component("der(bioreactor.V)"), "der");
        assert_eq!(component("_D_cse1"), "");
        assert_eq!(component("time"), "time");
    }

    #[test]
    fn test_describe_parts_sorted_case_folded() {
        let session = session(Backend::OneShot);
        let parts = describe_parts(
            session.engine().description(),
            &session.application().components_minimum,
        );
        assert_eq!(
            parts,
            vec!["bioreactor", "bioreactor.culture", "liquidphase", "MSL"]
        );
    }

    #[test]
    fn test_describe_special_names() {
        let session = session(Backend::OneShot);
        assert!(describe(&session, "culture", 3).unwrap().contains("H1022"));
        assert_eq!(describe(&session, "time", 3).unwrap(), "Time [ h ]");
        assert!(describe(&session, "MSL", 3).unwrap().starts_with("MSL: 4.1.0"));

        let broth = describe(&session, "media", 3).unwrap();
        assert!(broth.contains("Substrate glucose concentration"));
        assert!(broth.contains("180"));
    }

    #[test]
    fn test_describe_parameter_with_unit() {
        let mut session = session(Backend::OneShot);
        session.simu().options(SimulateOptions::fast()).call();

        let text = describe(&session, "mum", 2).unwrap();
        assert_eq!(text, "Maximal specific growth rate : 0.40 [ 1/h ]");
    }

    #[test]
    fn test_describe_unknown_name() {
        let session = session(Backend::OneShot);
        assert!(describe(&session, "nothing.here", 3).is_err());
    }

    #[test]
    fn test_disp_modes() {
        let mut session = session(Backend::Instance);
        session.simu().options(SimulateOptions::fast()).call();

        let short = disp(&session, "V", 3, DispMode::Short);
        assert!(short.contains("V_0"));
        assert!(short.contains("4.500"));
        assert!(!short.contains("bioreactor.V_0"));

        let long = disp(&session, "culture", 3, DispMode::Long);
        assert!(long.contains("bioreactor.culture.qGr"));
        assert!(long.contains("0.500"));
    }

    #[test]
    fn test_system_info() {
        let session = session(Backend::Instance);
        let info = system_info(&session);
        assert_eq!(info.kind, "ME");
        assert_eq!(info.model_name, "BPL_YEAST_COB.Batch");
        assert_eq!(info.msl_version, "4.1.0");
        assert!(info.to_string().contains(" -Engine: instance"));
    }
}
