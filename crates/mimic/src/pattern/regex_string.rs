//! Strings constrained by a regular expression: `(string matching [A-Z]{3})`.
//!
//! The expression must match the whole string. Everything after the
//! `string matching ` prefix up to the closing parenthesis is the expression,
//! so optionality is declared on the key (`code?`) rather than the token.

use crate::error::ContractError;
use crate::result::MatchResult;
use crate::value::Value;
use regex::Regex;
use std::sync::Arc;

pub(crate) const REGEX_PREFIX: &str = "string matching ";

/// Longest run generated for an unbounded repetition (`*`, `+`, `{n,}`).
const MAX_REPEAT: u32 = 8;

#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    regex: Arc<Regex>,
}

impl RegexPattern {
    pub fn new(source: &str) -> Result<Self, ContractError> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex: Arc::new(regex),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub(super) fn matches(&self, value: &Value) -> MatchResult {
        match value {
            Value::String(text) if self.is_match(text) => MatchResult::Success,
            Value::String(text) => MatchResult::failure(format!(
                "expected string matching {}, got \"{text}\"",
                self.source
            )),
            other => MatchResult::mismatch(format!("string matching {}", self.source), other),
        }
    }

    pub(super) fn generate(&self) -> Result<Value, ContractError> {
        let generator = rand_regex::Regex::compile(&self.source, MAX_REPEAT).map_err(|e| {
            ContractError::Unsupported(format!(
                "cannot generate a string matching {}: {e}",
                self.source
            ))
        })?;
        let text: String = rand::Rng::sample(&mut rand::thread_rng(), &generator);
        Ok(Value::String(text))
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
