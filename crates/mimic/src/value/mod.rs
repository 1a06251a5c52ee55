//! Runtime data values exchanged with the stub.
//!
//! `Value` is the tagged union every pattern validates and generates. Objects
//! keep their key order, and XML elements keep attribute and child order, so a
//! value written back out looks like the one that came in.

mod xml;

pub(crate) use xml::write_fragment;
pub use xml::XmlElement;

use crate::error::ContractError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Concrete data value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON `null`, an empty body, or an absent value.
    #[default]
    Null,
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
    Xml(XmlElement),
}

impl Value {
    /// Name of the runtime tag, used in mismatch reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "json object",
            Value::Xml(_) => "xml",
        }
    }

    pub fn number(n: i64) -> Self {
        Value::Number(n.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Null, or a string with no content.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// A string of the form `(...)`, i.e. a pattern reference embedded in data.
    pub fn as_pattern_token(&self) -> Option<&str> {
        match self {
            Value::String(s) if is_pattern_token(s) => Some(s.trim()),
            _ => None,
        }
    }

    /// Textual literal of the value, as it would appear in a table cell or a
    /// plain-text body.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::List(items) if items.iter().all(|v| matches!(v, Value::Xml(_))) && !items.is_empty() => {
                items.iter().map(Value::to_literal).collect()
            }
            Value::List(_) | Value::Object(_) => self.to_json().to_string(),
            Value::Xml(element) => element.to_xml_string(),
        }
    }

    /// Content type a body of this value is served with.
    pub fn content_type(&self) -> &'static str {
        match self {
            Value::List(items) if items.iter().any(|v| matches!(v, Value::Xml(_))) => {
                "application/xml"
            }
            Value::List(_) | Value::Object(_) => "application/json",
            Value::Xml(_) => "application/xml",
            _ => "text/plain",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Xml(element) => serde_json::Value::String(element.to_xml_string()),
        }
    }

    /// Parse JSON text.
    pub fn parse_json(text: &str) -> Result<Value, ContractError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Value::from(json))
    }

    /// Parse an XML document; the root element becomes the value.
    pub fn parse_xml(text: &str) -> Result<Value, ContractError> {
        XmlElement::parse(text).map(Value::Xml)
    }

    /// Interpret a body by its leading character: `{`/`[` as JSON, `<` as XML,
    /// blank as `Null`, anything else (or anything unparseable) as a string.
    pub fn parse_body(text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        let parsed = match trimmed.as_bytes()[0] {
            b'{' | b'[' => Value::parse_json(trimmed).ok(),
            b'<' => Value::parse_xml(trimmed).ok(),
            _ => None,
        };
        parsed.unwrap_or_else(|| Value::String(text.to_string()))
    }

    /// Numeric-aware equality: `10` and `10.0` are the same number.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                    return x == y;
                }
                if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
                    return x == y;
                }
                if a.is_f64() || b.is_f64() {
                    return a.as_f64() == b.as_f64();
                }
                false
            }
            (Value::Null, other) | (other, Value::Null) => other.is_empty(),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.same_as(w)))
            }
            _ => self == other,
        }
    }
}

/// `(...)` after trimming.
pub fn is_pattern_token(text: &str) -> bool {
    let text = text.trim();
    text.len() >= 2 && text.starts_with('(') && text.ends_with(')')
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
