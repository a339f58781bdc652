//! Parameter store of an exploration session.
//!
//! Each application parameter has a short name (`VX_start`, `mum`) and exactly one
//! model path (`bioreactor.m_start[1]`, `bioreactor.culture.mum`). Values may be missing
//! until the user sets them; a run refuses to start while any value is missing.
//!
//! Updates are fail-soft: unknown names and non-numeric values are reported and
//! skipped, and validity requirements are checked after the update without rolling
//! anything back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unit::value::Value;

use super::{
    error::ExploreError,
    naming::InitialValueMarker,
    report::{Issue, IssueKind, Report, Severity},
};

/// A registered parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    /// Short name, e.g. `VX_start`
    pub name: String,
    /// Model path the value is applied to
    pub location: String,
    /// `None` until set
    pub value: Option<Value>,
}

impl ParameterEntry {
    fn is_missing(&self) -> bool {
        self.value.as_ref().map_or(true, Value::is_missing)
    }
}

/// Comparison used by a [`Requirement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Greater => write!(f, ">"),
            Comparison::GreaterOrEqual => write!(f, ">="),
        }
    }
}

/// A validity requirement on a parameter value, such as `V_start > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Short name of the parameter
    pub name: String,
    pub comparison: Comparison,
    pub bound: f64,
}

impl Requirement {
    pub fn new(name: impl Into<String>, comparison: Comparison, bound: f64) -> Self {
        Self {
            name: name.into(),
            comparison,
            bound,
        }
    }

    /// Non-numeric or missing values never satisfy a requirement.
    pub fn holds(&self, value: Option<&Value>) -> bool {
        match value.and_then(Value::as_f64) {
            Some(v) if !v.is_nan() => match self.comparison {
                Comparison::Greater => v > self.bound,
                Comparison::GreaterOrEqual => v >= self.bound,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.comparison, self.bound)
    }
}

/// Registered parameters, key variables and requirements, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterStore {
    marker: InitialValueMarker,
    entries: Vec<ParameterEntry>,
    /// Variables registered for lookup only, never applied to a run
    key_variables: Vec<(String, String)>,
    requirements: Vec<Requirement>,
}

impl ParameterStore {
    /// Creates an empty store for units following `marker`.
    pub fn new(marker: InitialValueMarker) -> Self {
        Self {
            marker,
            ..Default::default()
        }
    }

    pub fn marker(&self) -> InitialValueMarker {
        self.marker
    }

    /// Registers a parameter, replacing an earlier registration of the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        value: Option<Value>,
    ) {
        let entry = ParameterEntry {
            name: name.into(),
            location: location.into(),
            value,
        };
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Registers a variable that can be described and displayed but not set.
    pub fn register_key_variable(&mut self, name: impl Into<String>, location: impl Into<String>) {
        self.key_variables.push((name.into(), location.into()));
    }

    /// Adds a requirement checked by [`ParameterStore::set_parameters`].
    pub fn add_requirement(&mut self, requirement: Requirement) {
        self.requirements.push(requirement);
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    /// Parameter registered under the short name `name`.
    pub fn entry(&self, name: &str) -> Option<&ParameterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entry(name).and_then(|e| e.value.as_ref())
    }

    /// Model paths of registered key variables.
    pub fn key_variables(&self) -> impl Iterator<Item = &str> {
        self.key_variables.iter().map(|(_, location)| location.as_str())
    }

    /// Model path of a parameter or key variable.
    pub fn location(&self, name: &str) -> Option<&str> {
        self.entry(name)
            .map(|e| e.location.as_str())
            .or_else(|| {
                self.key_variables
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, location)| location.as_str())
            })
    }

    /// All `(name, location)` pairs, parameters first.
    pub fn locations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.location.as_str()))
            .chain(
                self.key_variables
                    .iter()
                    .map(|(n, l)| (n.as_str(), l.as_str())),
            )
    }

    /// Names whose value is missing.
    pub fn missing(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_missing())
            .map(|e| e.name.clone())
            .collect()
    }

    /// Requirements that do not hold for the current values.
    pub fn violated_requirements(&self) -> Vec<&Requirement> {
        self.requirements
            .iter()
            .filter(|r| !r.holds(self.value(&r.name)))
            .collect()
    }

    /// Updates known parameters and checks every requirement afterwards.
    ///
    /// Unknown names are reported once each and skipped, as are non-numeric values.
    /// Violated requirements are reported but the offending values are kept.
    ///
    /// # Arguments
    ///
    /// * `overrides` - Pairs of short name and new value
    ///
    /// # Returns
    ///
    /// A [`Report`] with one issue per unknown name, non-numeric value and violated
    /// requirement.
    ///
    /// # Examples
    ///
    /// ```
    /// use fmu_explore::prelude::*;
    ///
    /// let mut store = ParameterStore::new(InitialValueMarker::Start);
    /// store.register("V_start", "bioreactor.V_start", Some(Value::Real(4.5)));
    /// store.add_requirement(Requirement::new("V_start", Comparison::Greater, 0.0));
    ///
    /// let report = store.set_parameters([("V_start", -1.0), ("mu_max", 0.5)]);
    /// assert_eq!(report.of_kind(IssueKind::UnknownParameter).len(), 1);
    /// assert_eq!(report.of_kind(IssueKind::RequirementViolated).len(), 1);
    /// assert_eq!(store.value("V_start"), Some(&Value::Real(-1.0)));
    /// ```
    pub fn set_parameters<I, K, V>(&mut self, overrides: I) -> Report
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut report = Report::new();

        for (name, value) in overrides {
            let name = name.as_ref();
            match self.entries.iter_mut().find(|e| e.name == name) {
                Some(entry) => assign(&mut report, entry, value.into()),
                None => unknown(&mut report, name),
            }
        }

        for requirement in self.violated_requirements() {
            let message = format!("Requirement {requirement} does not hold");
            log::error!("{message}");
            report.add_issue(Issue::new(
                requirement.to_string(),
                message,
                Severity::Error,
                IssueKind::RequirementViolated,
            ));
        }

        report
    }

    /// Updates initial values.
    ///
    /// Only names carrying the initial-value marker are accepted. A name may be the
    /// short name (`VX_start`) or the model path of a registered initial value
    /// (`bioreactor.m_start[1]`). Requirements are not checked here.
    ///
    /// # Arguments
    ///
    /// * `overrides` - Pairs of name and new value
    ///
    /// # Returns
    ///
    /// A [`Report`] with one issue per name that is not an initial value, is unknown or
    /// comes with a non-numeric value.
    pub fn set_initial_values<I, K, V>(&mut self, overrides: I) -> Report
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut report = Report::new();

        for (name, value) in overrides {
            let name = name.as_ref();
            if !self.marker.marks(name) {
                let err = ExploreError::NotAnInitialValue(name.to_string());
                log::error!("{err}, use set_parameters instead");
                report.add_issue(Issue::new(
                    name.to_string(),
                    format!("{err}, use set_parameters instead"),
                    Severity::Error,
                    IssueKind::NotAnInitialValue,
                ));
                continue;
            }

            let entry = self
                .entries
                .iter_mut()
                .find(|e| e.name == name || e.location == name);

            match entry {
                Some(entry) => assign(&mut report, entry, value.into()),
                None => unknown(&mut report, name),
            }
        }

        report
    }
}

/// Stores a numeric value. Anything else is reported and skipped, the entry keeps its
/// previous value.
fn assign(report: &mut Report, entry: &mut ParameterEntry, value: Value) {
    if value.as_f64().is_none() {
        let err = ExploreError::NotNumeric(entry.name.clone(), value.to_string());
        log::error!("{err}");
        report.add_issue(Issue::new(
            entry.name.clone(),
            err.to_string(),
            Severity::Error,
            IssueKind::NotNumeric,
        ));
        return;
    }

    log::debug!("parameter {} = {value}", entry.name);
    entry.value = Some(value);
}

fn unknown(report: &mut Report, name: &str) {
    let err = ExploreError::UnknownParameter(name.to_string());
    log::error!("{err}");
    report.add_issue(Issue::new(
        name.to_string(),
        format!("{err}, check the spelling"),
        Severity::Error,
        IssueKind::UnknownParameter,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParameterStore {
        let mut store = ParameterStore::new(InitialValueMarker::Start);
        store.register("V_start", "bioreactor.V_start", Some(Value::Real(4.5)));
        store.register("VX_start", "bioreactor.m_start[1]", Some(Value::Real(1.0)));
        store.register("mum", "bioreactor.culture.mum", None);
        store.register_key_variable("mu", "bioreactor.culture.mu");
        store.add_requirement(Requirement::new("V_start", Comparison::Greater, 0.0));
        store.add_requirement(Requirement::new("VX_start", Comparison::GreaterOrEqual, 0.0));
        store
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let mut store = store();
        let before = store.entries().to_vec();

        let report = store.set_parameters([("Vx_start", 2.0), ("qO3", 1.0)]);

        assert_eq!(report.of_kind(IssueKind::UnknownParameter).len(), 2);
        assert_eq!(store.entries(), &before[..]);
    }

    #[test]
    fn test_violation_keeps_value() {
        let mut store = store();
        let report = store.set_parameters([("V_start", -1.0)]);

        let violations = report.of_kind(IssueKind::RequirementViolated);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location(), "V_start > 0");
        assert_eq!(store.value("V_start"), Some(&Value::Real(-1.0)));
    }

    #[test]
    fn test_text_values_are_rejected() {
        let mut store = store();

        let report = store.set_parameters([("V_start", Value::from("abc"))]);
        assert_eq!(report.of_kind(IssueKind::NotNumeric).len(), 1);
        assert!(!report.is_valid);
        assert_eq!(store.value("V_start"), Some(&Value::Real(4.5)));

        let report = store.set_initial_values([("VX_start", Value::from("two"))]);
        assert_eq!(report.of_kind(IssueKind::NotNumeric).len(), 1);
        assert_eq!(store.value("VX_start"), Some(&Value::Real(1.0)));

        let report = store.set_parameters([("mum", Value::Integer(1))]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_boundary_of_greater_or_equal() {
        let mut store = store();
        let report = store.set_parameters([("VX_start", 0.0)]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_initial_values_require_marker() {
        let mut store = store();
        let report = store.set_initial_values([("mum", 0.2), ("VX_start", 3.0)]);

        assert_eq!(report.of_kind(IssueKind::NotAnInitialValue).len(), 1);
        assert_eq!(store.value("VX_start"), Some(&Value::Real(3.0)));
        assert_eq!(store.value("mum"), None);
    }

    #[test]
    fn test_initial_values_accept_model_paths() {
        let mut store = store();
        let report = store.set_initial_values([("bioreactor.m_start[1]", 2.5)]);

        assert!(report.is_empty());
        assert_eq!(store.value("VX_start"), Some(&Value::Real(2.5)));
    }

    #[test]
    fn test_unknown_initial_value_is_reported() {
        let mut store = store();
        let report = store.set_initial_values([("VZ_start", 2.5)]);
        assert_eq!(report.of_kind(IssueKind::UnknownParameter).len(), 1);
    }

    #[test]
    fn test_missing_and_locations() {
        let store = store();
        assert_eq!(store.missing(), vec!["mum".to_string()]);
        assert_eq!(store.location("mu"), Some("bioreactor.culture.mu"));
        assert_eq!(store.location("VX_start"), Some("bioreactor.m_start[1]"));
        assert_eq!(store.locations().count(), 4);
    }

    #[test]
    fn test_requirement_display() {
        let requirement = Requirement::new("VG_start", Comparison::GreaterOrEqual, 0.0);
        assert_eq!(requirement.to_string(), "VG_start >= 0");
    }
}
