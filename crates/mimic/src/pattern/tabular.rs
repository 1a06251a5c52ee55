//! Object schemas.
//!
//! Keys ending in `?` are optional: an absent (or null) value is accepted,
//! a present value must match.

use super::{Pattern, Row};
use crate::error::ContractError;
use crate::resolver::Resolver;
use crate::result::MatchResult;
use crate::value::Value;
use indexmap::IndexMap;

const OPTIONAL_SUFFIX: char = '?';

pub fn is_optional_key(key: &str) -> bool {
    key.ends_with(OPTIONAL_SUFFIX)
}

/// The key without its optionality marker.
pub fn key_name(key: &str) -> &str {
    key.strip_suffix(OPTIONAL_SUFFIX).unwrap_or(key)
}

/// Find the declared key for a field name, with or without the marker.
pub(super) fn declared<'a>(
    fields: &'a IndexMap<String, Pattern>,
    name: &str,
) -> Option<(&'a String, &'a Pattern)> {
    fields
        .get_key_value(name)
        .or_else(|| fields.get_key_value(format!("{name}{OPTIONAL_SUFFIX}").as_str()))
}

pub(super) fn matches(
    fields: &IndexMap<String, Pattern>,
    object: &IndexMap<String, Value>,
    resolver: &Resolver,
) -> MatchResult {
    for (key, pattern) in fields {
        let name = key_name(key);
        match object.get(name) {
            Some(Value::Null) if is_optional_key(key) => {}
            Some(value) => {
                let result = resolver.matches_pattern(pattern, value).breadcrumb(name);
                if result.is_failure() {
                    return result;
                }
            }
            None if is_optional_key(key) => {}
            None => return MatchResult::failure(format!("Expected key named \"{name}\" was missing")),
        }
    }

    if resolver.strict_keys() {
        if let Some(unexpected) = object.keys().find(|key| declared(fields, key).is_none()) {
            return MatchResult::failure(format!("Key named \"{unexpected}\" was unexpected"));
        }
    }

    MatchResult::Success
}

pub(super) fn generate(
    fields: &IndexMap<String, Pattern>,
    resolver: &Resolver,
    stack: &mut Vec<String>,
) -> Result<Value, ContractError> {
    let mut object = IndexMap::with_capacity(fields.len());
    for (key, pattern) in fields {
        match pattern.generate_with(resolver, stack) {
            Ok(value) => {
                object.insert(key_name(key).to_string(), value);
            }
            Err(ContractError::RecursiveType(_)) if is_optional_key(key) => {}
            Err(error) => return Err(error),
        }
    }
    Ok(Value::Object(object))
}

pub(super) fn concretize(
    fields: &IndexMap<String, Pattern>,
    row: &Row,
    resolver: &Resolver,
    stack: &mut Vec<String>,
) -> Result<IndexMap<String, Pattern>, ContractError> {
    let mut concrete = IndexMap::with_capacity(fields.len());
    for (key, pattern) in fields {
        let pattern = match row.get(key_name(key)) {
            Some(literal) => Pattern::Exact(pattern.parse(literal, resolver)?),
            None => pattern.concretize_with(row, resolver, stack)?,
        };
        concrete.insert(key.clone(), pattern);
    }
    Ok(concrete)
}

pub(super) fn new_based_on(
    fields: &IndexMap<String, Pattern>,
    row: &Row,
    resolver: &Resolver,
    stack: &mut Vec<String>,
) -> Result<Vec<Pattern>, ContractError> {
    // Per field: the alternatives it contributes, `None` meaning "omit".
    let mut choices: Vec<Vec<Option<(String, Pattern)>>> = Vec::with_capacity(fields.len());

    for (key, pattern) in fields {
        let name = key_name(key);
        let alternatives = if let Some(literal) = row.get(name) {
            let value = pattern.parse(literal, resolver)?;
            vec![Some((key.clone(), Pattern::Exact(value)))]
        } else {
            let mut alternatives: Vec<_> = pattern
                .new_based_on_with(row, resolver, stack)?
                .into_iter()
                .map(|variant| Some((name.to_string(), variant)))
                .collect();
            if is_optional_key(key) {
                alternatives.push(None);
            } else {
                for alternative in alternatives.iter_mut().flatten() {
                    alternative.0 = key.clone();
                }
            }
            alternatives
        };
        choices.push(alternatives);
    }

    let mut variants: Vec<IndexMap<String, Pattern>> = vec![IndexMap::new()];
    for alternatives in choices {
        let mut next = Vec::with_capacity(variants.len() * alternatives.len());
        for partial in &variants {
            for alternative in &alternatives {
                let mut extended = partial.clone();
                if let Some((key, pattern)) = alternative {
                    extended.insert(key.clone(), pattern.clone());
                }
                next.push(extended);
            }
        }
        variants = next;
    }

    Ok(variants.into_iter().map(Pattern::Tabular).collect())
}
