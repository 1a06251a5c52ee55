//! Pattern text.
//!
//! ```text
//! (number) (string) (boolean) (datetime) (null)   scalars
//! (Person)                                        named type
//! (Person?) (number*)                             optional, list
//! (string matching [A-Z]{3})                      regex-constrained string
//! {"id": "(number)", "nickname?": "(string)"}     object schema
//! ["(number)", "(string)"]  ["(Item*)"]           positional array, list
//! <person id="(number)">(string)</person>        xml element
//! anything else                                   exact literal
//! ```

use super::regex_string::{RegexPattern, REGEX_PREFIX};
use super::{Pattern, XmlPattern};
use crate::error::ContractError;
use crate::value::{is_pattern_token, Value, XmlElement};

/// Compile pattern text.
pub fn parse_pattern(text: &str) -> Result<Pattern, ContractError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Pattern::Null);
    }
    if is_pattern_token(trimmed) {
        return token_pattern(&trimmed[1..trimmed.len() - 1]);
    }
    match trimmed.as_bytes()[0] {
        b'{' | b'[' => Ok(Pattern::from_value(&Value::parse_json(trimmed)?)),
        b'<' => Ok(Pattern::Xml(XmlPattern::from_element(&XmlElement::parse(trimmed)?))),
        _ => Ok(Pattern::Exact(Value::string(trimmed))),
    }
}

/// Compile the inside of a `(...)` token.
///
/// A `name:type` token (a named URL parameter) compiles to its type. Fails
/// only on an invalid regular expression.
pub fn token_pattern(token: &str) -> Result<Pattern, ContractError> {
    let token = token.trim();
    if let Some(source) = token.strip_prefix(REGEX_PREFIX) {
        return Ok(Pattern::Regex(RegexPattern::new(source)?));
    }
    if let Some(inner) = token.strip_suffix('?') {
        return Ok(Pattern::optional(token_pattern(inner)?));
    }
    if let Some(inner) = token.strip_suffix('*') {
        return Ok(Pattern::list(token_pattern(inner)?));
    }
    if let Some((_, type_name)) = token.split_once(':') {
        return token_pattern(type_name);
    }
    Ok(match token {
        "boolean" => Pattern::Boolean,
        "number" => Pattern::Number,
        "string" => Pattern::String,
        "datetime" => Pattern::DateTime,
        "null" => Pattern::Null,
        name => Pattern::Deferred(name.to_string()),
    })
}

/// A token becomes its pattern; any other text, including a token with an
/// invalid expression, is an exact string.
pub(super) fn text_pattern(text: &str) -> Pattern {
    let trimmed = text.trim();
    if is_pattern_token(trimmed) {
        if let Ok(pattern) = token_pattern(&trimmed[1..trimmed.len() - 1]) {
            return pattern;
        }
    }
    Pattern::Exact(Value::string(text))
}

impl Pattern {
    /// Read a concrete value as a pattern.
    ///
    /// String tokens become their pattern, objects become schemas with the
    /// same keys, and everything else must match exactly.
    pub fn from_value(value: &Value) -> Pattern {
        match value {
            Value::Null => Pattern::Null,
            Value::String(text) => text_pattern(text),
            Value::Object(object) => Pattern::Tabular(
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), Pattern::from_value(value)))
                    .collect(),
            ),
            Value::List(items) => {
                let mut patterns: Vec<Pattern> = items.iter().map(Pattern::from_value).collect();
                if let [Pattern::List(_)] = patterns.as_slice() {
                    return patterns.remove(0);
                }
                Pattern::Array(patterns)
            }
            Value::Xml(element) => Pattern::Xml(XmlPattern::from_element(element)),
            other => Pattern::Exact(other.clone()),
        }
    }
}
