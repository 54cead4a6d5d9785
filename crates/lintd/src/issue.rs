//! Issues reported by the engine and the callback that receives them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::ClientInputFile;
use crate::sink::SinkError;

/// Errors an issue listener can return to the engine.
///
/// Any error aborts the analysis that is currently running.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IssueError {
    /// The engine used a severity label outside [`Severity`]
    #[error("invalid severity: {0:?}")]
    InvalidSeverity(String),
    /// The outbound sink rejected the issue
    #[error("issue sink unavailable: {0}")]
    Sink(#[from] SinkError),
}

/// Closed set of issue severities, least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational finding
    Info,
    /// Minor issue
    Minor,
    /// Major issue
    Major,
    /// Critical issue
    Critical,
    /// Blocking issue
    Blocker,
}

impl Severity {
    /// Upper-case label, as used by the engine.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
            Severity::Blocker => "BLOCKER",
        }
    }
}

impl FromStr for Severity {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(Severity::Info),
            "MINOR" => Ok(Severity::Minor),
            "MAJOR" => Ok(Severity::Major),
            "CRITICAL" => Ok(Severity::Critical),
            "BLOCKER" => Ok(Severity::Blocker),
            other => Err(IssueError::InvalidSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One finding, as the engine reports it.
///
/// The span is whatever the engine produced; nothing here validates it.
/// `severity` is the engine's free-text label and may not parse.
#[derive(Debug)]
pub struct Issue<'a, T> {
    /// First line of the span
    pub start_line: i32,
    /// Offset into the first line
    pub start_line_offset: i32,
    /// Last line of the span
    pub end_line: i32,
    /// Offset into the last line
    pub end_line_offset: i32,
    /// Human-readable message
    pub message: String,
    /// Rule key, e.g. `text:LineLength`
    pub rule_key: String,
    /// Rule display name
    pub rule_name: String,
    /// Severity label
    pub severity: String,
    /// The file the issue is on, if it is file-level
    pub input_file: Option<&'a ClientInputFile<T>>,
}

/// Receives issues synchronously from a running analysis.
pub trait IssueListener<T> {
    /// Handle one issue. Returning an error aborts the analysis.
    fn handle(&mut self, issue: &Issue<'_, T>) -> Result<(), IssueError>;
}

impl<T> IssueListener<T> for Vec<String> {
    /// Collects the rule keys of handled issues.
    fn handle(&mut self, issue: &Issue<'_, T>) -> Result<(), IssueError> {
        self.push(issue.rule_key.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_severities() {
        for severity in [
            Severity::Info,
            Severity::Minor,
            Severity::Major,
            Severity::Critical,
            Severity::Blocker,
        ] {
            assert_eq!(severity.name().parse::<Severity>().unwrap(), severity);
        }
    }

    #[test]
    fn test_unknown_severity_is_rejected() {
        assert_eq!(
            "SEVERE".parse::<Severity>(),
            Err(IssueError::InvalidSeverity("SEVERE".to_string()))
        );
        // Labels are exact: no case folding
        assert!("major".parse::<Severity>().is_err());
        assert!("".parse::<Severity>().is_err());
    }

    #[test]
    fn test_rule_key_collector() {
        let mut seen: Vec<String> = Vec::new();
        let issue = Issue::<()> {
            start_line: 1,
            start_line_offset: 0,
            end_line: 1,
            end_line_offset: 4,
            message: "msg".to_string(),
            rule_key: "key".to_string(),
            rule_name: "name".to_string(),
            severity: "MAJOR".to_string(),
            input_file: None,
        };
        seen.handle(&issue).unwrap();
        assert_eq!(seen, vec!["key"]);
    }
}
