//! Error types for contract compilation and stub operations.

use crate::result::Failure;
use std::fmt;
use thiserror::Error;

/// Errors raised while compiling contracts or converting literals.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("could not parse {literal:?} as {expected}")]
    Parse { expected: String, literal: String },
    #[error("type {0} is not declared")]
    UndeclaredType(String),
    #[error("type {0} is recursive and has no optional exit, cannot generate a value")]
    RecursiveType(String),
    #[error("malformed table row {row:?}: expected {expected} columns, found {found}")]
    MalformedTable {
        row: String,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {message}")]
    Compile { line: usize, message: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML: {0}")]
    Xml(String),
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("{0}")]
    Mismatch(Failure),
    #[error("{0}")]
    Unsupported(String),
}

impl ContractError {
    pub fn parse(expected: impl fmt::Display, literal: impl Into<String>) -> Self {
        ContractError::Parse {
            expected: expected.to_string(),
            literal: literal.into(),
        }
    }

    pub fn compile(line: usize, message: impl Into<String>) -> Self {
        ContractError::Compile {
            line,
            message: message.into(),
        }
    }

    /// Attach a line number to errors that do not carry one yet.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            ContractError::Compile { .. } => self,
            other => ContractError::compile(line, other.to_string()),
        }
    }
}

/// A request, response or message that no scenario accepts.
///
/// Carries the failure of every candidate scenario so the report can say
/// which scenarios were tried and why each one rejected the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoMatchingScenario {
    pub failures: Vec<(String, Failure)>,
}

impl NoMatchingScenario {
    pub fn new(failures: Vec<(String, Failure)>) -> Self {
        Self { failures }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: NoMatchingScenario) {
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for NoMatchingScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return f.write_str("no scenarios to match against");
        }
        let mut first = true;
        for (scenario, failure) in &self.failures {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "In scenario \"{scenario}\": {}", failure.report())?;
        }
        Ok(())
    }
}

impl std::error::Error for NoMatchingScenario {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matching_scenario_lists_every_candidate() {
        let error = NoMatchingScenario::new(vec![
            ("Square".to_string(), Failure::new("method mismatch")),
            ("Cube".to_string(), Failure::new("path mismatch")),
        ]);
        let report = error.to_string();
        assert!(report.contains("In scenario \"Square\": method mismatch"));
        assert!(report.contains("In scenario \"Cube\": path mismatch"));
    }

    #[test]
    fn test_at_line_wraps_plain_errors() {
        let error = ContractError::UndeclaredType("Person".into()).at_line(7);
        assert_eq!(error.to_string(), "line 7: type Person is not declared");
    }
}
