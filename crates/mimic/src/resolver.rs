//! The matching context threaded through every pattern operation.

use crate::error::ContractError;
use crate::pattern::{parse_pattern, Pattern};
use crate::result::MatchResult;
use crate::value::{is_pattern_token, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Named patterns declared by a feature, keyed by bare type name.
pub type Types = IndexMap<String, Pattern>;

/// Named-type lookups plus the mode and leniency flags for one match.
///
/// Cheap to clone: the dictionary is shared. A `Deferred` pattern is resolved
/// through `lookup` each time it is used; nothing is cached here.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    types: Arc<Types>,
    mock_mode: bool,
    strict_keys: bool,
}

impl Resolver {
    pub fn new(types: Arc<Types>) -> Self {
        Self {
            types,
            mock_mode: false,
            strict_keys: false,
        }
    }

    /// Accept pattern tokens such as `"(number)"` in place of concrete values.
    ///
    /// Used when the value being checked is itself an example written by a
    /// person (a mock file, a registered expectation) rather than live traffic.
    pub fn in_mock_mode(mut self) -> Self {
        self.mock_mode = true;
        self
    }

    /// Reject object keys that the schema does not declare.
    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    pub fn is_mock_mode(&self) -> bool {
        self.mock_mode
    }

    pub fn strict_keys(&self) -> bool {
        self.strict_keys
    }

    pub fn types(&self) -> &Types {
        &self.types
    }

    pub fn shared_types(&self) -> Arc<Types> {
        Arc::clone(&self.types)
    }

    pub fn lookup(&self, name: &str) -> Result<&Pattern, ContractError> {
        self.types
            .get(name)
            .ok_or_else(|| ContractError::UndeclaredType(name.to_string()))
    }

    /// Match a value, honouring mock mode for embedded pattern tokens.
    pub fn matches_pattern(&self, pattern: &Pattern, value: &Value) -> MatchResult {
        if self.mock_mode {
            if let Some(token) = value.as_pattern_token() {
                return self.matches_token(pattern, token);
            }
        }
        pattern.matches(value, self)
    }

    /// Match text that arrives untyped (path segments, headers, XML text,
    /// plain bodies) by parsing it with the expected pattern first.
    pub fn matches_text(&self, pattern: &Pattern, text: &str) -> MatchResult {
        if self.mock_mode && is_pattern_token(text) {
            return self.matches_token(pattern, text.trim());
        }
        match pattern.parse(text, self) {
            Ok(value) => pattern.matches(&value, self),
            Err(error) => MatchResult::failure(error.to_string()),
        }
    }

    /// Match a body value: strings are parsed with the pattern, structured
    /// values are matched directly.
    pub fn matches_body(&self, pattern: &Pattern, body: &Value) -> MatchResult {
        match body {
            Value::String(text) => self.matches_text(pattern, text),
            other => self.matches_pattern(pattern, other),
        }
    }

    fn matches_token(&self, pattern: &Pattern, token: &str) -> MatchResult {
        match parse_pattern(token) {
            Ok(token_pattern) => pattern.encompasses(&token_pattern, self, self),
            Err(error) => MatchResult::failure(error.to_string()),
        }
    }
}
