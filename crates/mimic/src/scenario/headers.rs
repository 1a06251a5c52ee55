//! Header patterns. Names compare case-insensitively; a trailing `?` marks
//! an optional header. Headers the pattern does not declare are ignored.

use crate::error::ContractError;
use crate::pattern::{is_optional_key, key_name, Pattern, Row};
use crate::resolver::Resolver;
use crate::result::MatchResult;
use crate::value::Value;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeadersPattern(pub IndexMap<String, Pattern>);

impl HeadersPattern {
    pub fn from_values(headers: &IndexMap<String, String>) -> Self {
        Self(
            headers
                .iter()
                .map(|(name, value)| (name.clone(), Pattern::from_value(&Value::string(value.clone()))))
                .collect(),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>, pattern: Pattern) {
        self.0.insert(name.into(), pattern);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Pattern)> {
        self.0.iter()
    }

    fn find<'a, T>(map: &'a IndexMap<String, T>, name: &str) -> Option<(&'a String, &'a T)> {
        map.iter()
            .find(|(key, _)| key_name(key).eq_ignore_ascii_case(name))
    }

    pub fn matches(&self, headers: &IndexMap<String, String>, resolver: &Resolver) -> MatchResult {
        for (declared, pattern) in &self.0 {
            let name = key_name(declared);
            let result = match Self::find(headers, name) {
                Some((_, value)) => resolver.matches_text(pattern, value),
                None if is_optional_key(declared) => MatchResult::Success,
                None => MatchResult::failure(format!("Expected header named \"{name}\" was missing")),
            };
            if result.is_failure() {
                return result.breadcrumb(name);
            }
        }
        MatchResult::Success
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<IndexMap<String, String>, ContractError> {
        let mut headers = IndexMap::with_capacity(self.0.len());
        for (declared, pattern) in &self.0 {
            let value = pattern.generate(resolver)?;
            if !value.is_empty() {
                headers.insert(key_name(declared).to_string(), value.to_literal());
            }
        }
        Ok(headers)
    }

    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<Self, ContractError> {
        let mut headers = IndexMap::with_capacity(self.0.len());
        for (declared, pattern) in &self.0 {
            let name = key_name(declared);
            match row.get(name) {
                Some(literal) => {
                    headers.insert(name.to_string(), Pattern::Exact(pattern.parse(literal, resolver)?));
                }
                None => {
                    headers.insert(declared.clone(), pattern.clone());
                }
            }
        }
        Ok(Self(headers))
    }

    /// Every header set `other` accepts is accepted here.
    pub fn encompasses(&self, other: &Self, this_resolver: &Resolver, other_resolver: &Resolver) -> MatchResult {
        for (declared, pattern) in &self.0 {
            let name = key_name(declared);
            let result = match Self::find(&other.0, name) {
                Some((other_declared, _)) if is_optional_key(other_declared) && !is_optional_key(declared) => {
                    MatchResult::failure(format!(
                        "Header named \"{name}\" is optional in the other pattern but required here"
                    ))
                }
                Some((_, Pattern::Exact(Value::String(text)))) => this_resolver.matches_text(pattern, text),
                Some((_, other_pattern)) => pattern.encompasses(other_pattern, this_resolver, other_resolver),
                None if is_optional_key(declared) => MatchResult::Success,
                None => MatchResult::failure(format!("Expected header named \"{name}\" was missing")),
            };
            if result.is_failure() {
                return result.breadcrumb(name);
            }
        }
        MatchResult::Success
    }
}
