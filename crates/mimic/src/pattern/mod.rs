//! The pattern algebra: type descriptors over [`Value`]s.
//!
//! Every pattern can:
//!
//! 1. **match** a concrete value, reporting a breadcrumbed failure on mismatch
//! 2. **generate** a fresh conforming value
//! 3. **parse** a textual literal into a value of its kind
//! 4. **concretise** itself against a row of example literals (`new_based_on`)
//! 5. **encompass** another pattern (structural subtyping)
//!
//! The variant set is closed, so dispatch is a `match` per operation. Named
//! types are `Deferred` references resolved through the [`Resolver`] at use
//! time, which keeps forward and recursive references free of construction
//! order.
//!
//! # Module Structure
//!
//! - `syntax` - pattern text (`(number)`, `(Person*)`, JSON, XML) to `Pattern`
//! - `scalar` - boolean, number, string, datetime and null primitives
//! - `regex_string` - strings constrained by a regular expression
//! - `tabular` - object schemas with optional (`?`) keys
//! - `xml` - element patterns with optional (`.opt`) attributes
//! - `encompass` - the subtyping relation
//! - `row` - example rows, tables and cell escaping

mod encompass;
mod regex_string;
mod row;
mod scalar;
mod syntax;
mod tabular;
mod xml;

pub use regex_string::RegexPattern;
pub use row::{escape_cell, split_table_row, Examples, Row};
pub use syntax::{parse_pattern, token_pattern};
pub use tabular::{is_optional_key, key_name};
pub use xml::{attribute_name, XmlPattern};

use crate::error::ContractError;
use crate::resolver::Resolver;
use crate::result::{all_of, MatchResult};
use crate::value::Value;
use indexmap::IndexMap;
use rand::Rng;
use std::fmt;

/// Type descriptor for values.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Boolean,
    Number,
    String,
    /// A string holding an ISO-8601 date-time.
    DateTime,
    /// A string the expression matches in full.
    Regex(RegexPattern),
    /// Null or empty.
    Null,
    /// Exactly this value; numbers compare numerically.
    Exact(Value),
    /// Object schema; keys ending in `?` are optional.
    Tabular(IndexMap<String, Pattern>),
    /// Homogeneous list of any length.
    List(Box<Pattern>),
    /// Positional list; one pattern per element.
    Array(Vec<Pattern>),
    Xml(XmlPattern),
    /// Named type, looked up through the resolver.
    Deferred(String),
    /// The union of the inner pattern and null/absent.
    Optional(Box<Pattern>),
}

impl Pattern {
    pub fn optional(inner: Pattern) -> Self {
        Pattern::Optional(Box::new(inner))
    }

    pub fn list(inner: Pattern) -> Self {
        Pattern::List(Box::new(inner))
    }

    pub fn deferred(name: impl Into<String>) -> Self {
        Pattern::Deferred(name.into())
    }

    /// Short kind name used in mismatch reports.
    pub fn type_name(&self) -> String {
        match self {
            Pattern::Boolean => "boolean".into(),
            Pattern::Number => "number".into(),
            Pattern::String => "string".into(),
            Pattern::DateTime => "datetime".into(),
            Pattern::Regex(regex) => format!("string matching {}", regex.source()),
            Pattern::Null => "null".into(),
            Pattern::Exact(value) => format!("\"{}\"", value.to_literal()),
            Pattern::Tabular(_) => "json object".into(),
            Pattern::List(inner) => format!("list of {}", inner.type_name()),
            Pattern::Array(_) => "json array".into(),
            Pattern::Xml(xml) => format!("xml element <{}>", xml.name),
            Pattern::Deferred(name) => name.clone(),
            Pattern::Optional(inner) => format!("optional {}", inner.type_name()),
        }
    }

    /// The token form (`number`, `Person?`, `Item*`) when one exists.
    pub fn token_name(&self) -> Option<String> {
        match self {
            Pattern::Boolean
            | Pattern::Number
            | Pattern::String
            | Pattern::DateTime
            | Pattern::Regex(_)
            | Pattern::Null => Some(self.type_name()),
            Pattern::Deferred(name) => Some(name.clone()),
            // A suffix would be read as part of the expression.
            Pattern::Optional(inner) | Pattern::List(inner) if matches!(**inner, Pattern::Regex(_)) => None,
            Pattern::Optional(inner) => inner.token_name().map(|name| format!("{name}?")),
            Pattern::List(inner) => inner.token_name().map(|name| format!("{name}*")),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Pattern::Optional(_) | Pattern::Null)
    }

    /// Check a concrete value against this pattern.
    pub fn matches(&self, value: &Value, resolver: &Resolver) -> MatchResult {
        match self {
            Pattern::Boolean
            | Pattern::Number
            | Pattern::String
            | Pattern::DateTime
            | Pattern::Null => scalar::matches(self, value),
            Pattern::Regex(regex) => regex.matches(value),
            Pattern::Exact(expected) => {
                if expected.same_as(value) {
                    MatchResult::Success
                } else {
                    MatchResult::failure(format!(
                        "expected \"{}\", got \"{}\"",
                        expected.to_literal(),
                        value.to_literal()
                    ))
                }
            }
            Pattern::Tabular(fields) => match value {
                Value::Object(object) => tabular::matches(fields, object, resolver),
                other => MatchResult::mismatch("json object", other),
            },
            Pattern::List(inner) => match value {
                Value::List(items) => all_of(items.iter().enumerate().map(|(index, item)| {
                    resolver
                        .matches_pattern(inner, item)
                        .breadcrumb(format!("[{index}]"))
                })),
                other => MatchResult::mismatch("list", other),
            },
            Pattern::Array(patterns) => match value {
                Value::List(items) if items.len() == patterns.len() => {
                    all_of(patterns.iter().zip(items).enumerate().map(
                        |(index, (pattern, item))| {
                            resolver
                                .matches_pattern(pattern, item)
                                .breadcrumb(format!("[{index}]"))
                        },
                    ))
                }
                Value::List(items) => MatchResult::failure(format!(
                    "expected {} elements, got {}",
                    patterns.len(),
                    items.len()
                )),
                other => MatchResult::mismatch("json array", other),
            },
            Pattern::Xml(xml) => match value {
                Value::Xml(element) => xml.matches(element, resolver),
                other => MatchResult::mismatch(format!("xml element <{}>", xml.name), other),
            },
            Pattern::Deferred(name) => match resolver.lookup(name) {
                Ok(resolved) => resolver.matches_pattern(resolved, value),
                Err(error) => MatchResult::failure(error.to_string()),
            },
            Pattern::Optional(inner) => {
                if value.is_empty() {
                    MatchResult::Success
                } else {
                    resolver.matches_pattern(inner, value)
                }
            }
        }
    }

    /// Produce a fresh value this pattern accepts.
    ///
    /// Fails with [`ContractError::RecursiveType`] when a named type refers to
    /// itself without an optional or list exit on the way.
    pub fn generate(&self, resolver: &Resolver) -> Result<Value, ContractError> {
        self.generate_with(resolver, &mut Vec::new())
    }

    fn generate_with(
        &self,
        resolver: &Resolver,
        stack: &mut Vec<String>,
    ) -> Result<Value, ContractError> {
        match self {
            Pattern::Boolean
            | Pattern::Number
            | Pattern::String
            | Pattern::DateTime
            | Pattern::Null => Ok(scalar::generate(self)),
            Pattern::Regex(regex) => regex.generate(),
            Pattern::Exact(value) => Ok(value.clone()),
            Pattern::Tabular(fields) => tabular::generate(fields, resolver, stack),
            Pattern::List(inner) => {
                let count = rand::thread_rng().gen_range(1..=3);
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    match inner.generate_with(resolver, stack) {
                        Ok(item) => items.push(item),
                        Err(ContractError::RecursiveType(_)) => return Ok(Value::List(Vec::new())),
                        Err(error) => return Err(error),
                    }
                }
                Ok(self.list_of(items, resolver))
            }
            Pattern::Array(patterns) => patterns
                .iter()
                .map(|pattern| pattern.generate_with(resolver, stack))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Pattern::Xml(xml) => xml.generate_with(resolver, stack).map(Value::Xml),
            Pattern::Deferred(name) => {
                if stack.iter().any(|seen| seen == name) {
                    return Err(ContractError::RecursiveType(name.clone()));
                }
                let resolved = resolver.lookup(name)?;
                stack.push(name.clone());
                let generated = resolved.generate_with(resolver, stack);
                stack.pop();
                generated
            }
            Pattern::Optional(inner) => match inner.generate_with(resolver, stack) {
                Err(ContractError::RecursiveType(_)) => Ok(Value::Null),
                other => other,
            },
        }
    }

    /// Convert a textual literal into a value of this pattern's kind.
    pub fn parse(&self, text: &str, resolver: &Resolver) -> Result<Value, ContractError> {
        match self {
            Pattern::Boolean
            | Pattern::Number
            | Pattern::String
            | Pattern::DateTime
            | Pattern::Null => scalar::parse(self, text),
            Pattern::Regex(_) => Ok(Value::string(text)),
            Pattern::Exact(expected) => match expected {
                Value::Null => scalar::parse(&Pattern::Null, text),
                Value::Boolean(_) => scalar::parse(&Pattern::Boolean, text),
                Value::Number(_) => scalar::parse(&Pattern::Number, text),
                Value::String(_) => Ok(Value::string(text)),
                Value::List(_) | Value::Object(_) => Value::parse_json(text.trim()),
                Value::Xml(_) => Value::parse_xml(text.trim()),
            },
            Pattern::Tabular(_) | Pattern::List(_) | Pattern::Array(_) => {
                Value::parse_json(text.trim())
            }
            Pattern::Xml(_) => Value::parse_xml(text.trim()),
            Pattern::Deferred(name) => resolver.lookup(name)?.parse(text, resolver),
            Pattern::Optional(inner) => {
                if text.trim().is_empty() {
                    Ok(Value::Null)
                } else {
                    inner.parse(text, resolver)
                }
            }
        }
    }

    /// Test-case variants of this pattern for an example row.
    ///
    /// Object fields named like a row column become exact values; optional
    /// fields not named by the row yield variants with and without the field,
    /// so the count grows with the number of optional fields. Use
    /// [`Pattern::concretize`] for a single substituted pattern.
    /// Patterns with nothing to substitute return themselves.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<Vec<Pattern>, ContractError> {
        self.new_based_on_with(row, resolver, &mut Vec::new())
    }

    fn new_based_on_with(
        &self,
        row: &Row,
        resolver: &Resolver,
        stack: &mut Vec<String>,
    ) -> Result<Vec<Pattern>, ContractError> {
        match self {
            Pattern::Tabular(fields) => tabular::new_based_on(fields, row, resolver, stack),
            Pattern::List(inner) => Ok(inner
                .new_based_on_with(row, resolver, stack)?
                .into_iter()
                .map(Pattern::list)
                .collect()),
            Pattern::Xml(xml) => Ok(vec![Pattern::Xml(xml.new_based_on(row, resolver)?)]),
            Pattern::Deferred(name) => {
                if stack.iter().any(|seen| seen == name) {
                    return Ok(vec![self.clone()]);
                }
                let resolved = resolver.lookup(name)?;
                stack.push(name.clone());
                let variants = resolved.new_based_on_with(row, resolver, stack);
                stack.pop();
                variants
            }
            Pattern::Optional(inner) => {
                let mut variants = inner.new_based_on_with(row, resolver, stack)?;
                variants.push(Pattern::Null);
                Ok(variants)
            }
            _ => Ok(vec![self.clone()]),
        }
    }

    /// Substitute the literals of an example row, yielding one pattern.
    ///
    /// Object fields named like a row column become exact values; everything
    /// else, optional fields included, is kept as declared.
    pub fn concretize(&self, row: &Row, resolver: &Resolver) -> Result<Pattern, ContractError> {
        if row.is_empty() {
            return Ok(self.clone());
        }
        self.concretize_with(row, resolver, &mut Vec::new())
    }

    fn concretize_with(
        &self,
        row: &Row,
        resolver: &Resolver,
        stack: &mut Vec<String>,
    ) -> Result<Pattern, ContractError> {
        match self {
            Pattern::Tabular(fields) => tabular::concretize(fields, row, resolver, stack).map(Pattern::Tabular),
            Pattern::List(inner) => Ok(Pattern::list(inner.concretize_with(row, resolver, stack)?)),
            Pattern::Optional(inner) => Ok(Pattern::optional(inner.concretize_with(row, resolver, stack)?)),
            Pattern::Xml(xml) => Ok(Pattern::Xml(xml.new_based_on(row, resolver)?)),
            Pattern::Deferred(name) => {
                if stack.iter().any(|seen| seen == name) {
                    return Ok(self.clone());
                }
                let resolved = resolver.lookup(name)?;
                stack.push(name.clone());
                let concrete = resolved.concretize_with(row, resolver, stack);
                stack.pop();
                concrete
            }
            _ => Ok(self.clone()),
        }
    }

    /// Does every value accepted by `other` also satisfy `self`?
    pub fn encompasses(
        &self,
        other: &Pattern,
        this_resolver: &Resolver,
        other_resolver: &Resolver,
    ) -> MatchResult {
        encompass::Encompass::new(this_resolver, other_resolver).check(self, other)
    }

    /// Wrap generated values in the container this pattern family uses.
    pub fn list_of(&self, values: Vec<Value>, resolver: &Resolver) -> Value {
        match self {
            Pattern::Deferred(name) => match resolver.lookup(name) {
                Ok(resolved) => resolved.list_of(values, resolver),
                Err(_) => Value::List(values),
            },
            _ => Value::List(values),
        }
    }

    /// Names of every type this pattern refers to, without resolving them.
    pub fn collect_references(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Deferred(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Pattern::Tabular(fields) => fields.values().for_each(|p| p.collect_references(names)),
            Pattern::List(inner) | Pattern::Optional(inner) => inner.collect_references(names),
            Pattern::Array(patterns) => patterns.iter().for_each(|p| p.collect_references(names)),
            Pattern::Xml(xml) => xml
                .attributes
                .values()
                .chain(&xml.children)
                .for_each(|p| p.collect_references(names)),
            _ => {}
        }
    }

    /// Canonical JSON-compatible form, as written in contract text.
    pub fn to_json(&self) -> serde_json::Value {
        if let Some(token) = self.token_name() {
            return serde_json::Value::String(format!("({token})"));
        }
        match self {
            Pattern::Exact(value) => value.to_json(),
            Pattern::Tabular(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(key, pattern)| (key.clone(), pattern.to_json()))
                    .collect(),
            ),
            Pattern::Array(patterns) => {
                serde_json::Value::Array(patterns.iter().map(Pattern::to_json).collect())
            }
            Pattern::List(inner) => serde_json::Value::Array(vec![inner.to_json()]),
            Pattern::Optional(inner) => inner.to_json(),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(token) = self.token_name() {
            return write!(f, "({token})");
        }
        match self {
            Pattern::Exact(value) => f.write_str(&value.to_literal()),
            Pattern::Xml(xml) => write!(f, "{xml}"),
            other => f.write_str(&other.to_json().to_string()),
        }
    }
}
