//! Fail-soft reporting.
//!
//! Setting parameters never fails hard. Unknown names are skipped and violated
//! requirements are kept, and both are collected in a [`Report`] that the caller can
//! print or inspect.

use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// The name is not registered
    UnknownParameter,
    /// The name lacks the initial-value marker
    NotAnInitialValue,
    NotNumeric,
    /// A requirement fails after the update
    RequirementViolated,
}

/// Issues collected by a single call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// False if any issue has [`Severity::Error`].
    pub is_valid: bool,
    pub issues: Vec<Issue>,
}

impl Report {
    /// Creates an empty, valid report.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
        }
    }

    /// Adds an issue. An error marks the report invalid.
    pub fn add_issue(&mut self, issue: Issue) {
        if issue.severity == Severity::Error {
            self.is_valid = false;
        }
        self.issues.push(issue);
    }

    /// Issues of one kind.
    pub fn of_kind(&self, kind: IssueKind) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.kind == kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// A single reported issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    /// Parameter name or requirement the issue is about
    location: String,
    message: String,
    severity: Severity,
    kind: IssueKind,
}

impl Issue {
    pub fn new(location: String, message: String, severity: Severity, kind: IssueKind) -> Self {
        Self {
            location,
            message,
            severity,
            kind,
        }
    }

    /// Parameter name or requirement the issue is about.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Human-readable description of the issue.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// How serious the issue is.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// What went wrong.
    pub fn kind(&self) -> IssueKind {
        self.kind
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.severity {
            Severity::Error => self.message.bold().red(),
            Severity::Warning => self.message.bold().yellow(),
            Severity::Info => self.message.bold().green(),
        };

        write!(
            f,
            "[{}] {}:\n\t└── {}",
            self.location.bold(),
            self.severity.colored(),
            message
        )
    }
}

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    fn colored(&self) -> colored::ColoredString {
        match self {
            Severity::Error => "Error".bold().red(),
            Severity::Warning => "Warning".bold().yellow(),
            Severity::Info => "Info".bold().green(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_invalidates_report() {
        let mut report = Report::new();
        report.add_issue(Issue::new(
            "x".to_string(),
            "just a note".to_string(),
            Severity::Info,
            IssueKind::NotAnInitialValue,
        ));
        assert!(report.is_valid);

        report.add_issue(Issue::new(
            "y".to_string(),
            "not known".to_string(),
            Severity::Error,
            IssueKind::UnknownParameter,
        ));
        assert!(!report.is_valid);
        assert_eq!(report.of_kind(IssueKind::UnknownParameter).len(), 1);
    }

    #[test]
    fn test_display_contains_location_and_message() {
        colored::control::set_override(false);
        let issue = Issue::new(
            "V_start > 0".to_string(),
            "requirement violated".to_string(),
            Severity::Error,
            IssueKind::RequirementViolated,
        );
        assert_eq!(
            issue.to_string(),
            "[V_start > 0] Error:\n\t└── requirement violated"
        );
    }
}
