//! Inferring named types and example literals from concrete values.

use crate::pattern::Pattern;
use crate::resolver::Types;
use crate::value::{Value, XmlElement};
use indexmap::IndexMap;

/// Example literals gathered while inferring types.
///
/// `Discard` is used where literals would be meaningless as a single row,
/// such as response bodies and list elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleDeclarations {
    Collect(IndexMap<String, String>),
    Discard,
}

impl Default for ExampleDeclarations {
    fn default() -> Self {
        ExampleDeclarations::Collect(IndexMap::new())
    }
}

impl ExampleDeclarations {
    /// `name`, or `name` followed by as many `_` as needed to be unused by
    /// both the examples and `taken`.
    pub fn get_new_name<'a>(&self, name: &str, taken: impl IntoIterator<Item = &'a String> + Clone) -> String {
        let mut candidate = name.to_string();
        while self.contains(&candidate) || taken.clone().into_iter().any(|t| *t == candidate) {
            candidate.push('_');
        }
        candidate
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            ExampleDeclarations::Collect(examples) => examples.contains_key(name),
            ExampleDeclarations::Discard => false,
        }
    }

    /// Record a literal under a fresh name derived from `name`.
    pub fn add(&mut self, name: &str, literal: String) {
        let fresh = self.get_new_name(name, std::iter::empty::<&String>());
        if let ExampleDeclarations::Collect(examples) = self {
            examples.insert(fresh, literal);
        }
    }

    pub fn examples(&self) -> Option<&IndexMap<String, String>> {
        match self {
            ExampleDeclarations::Collect(examples) => Some(examples),
            ExampleDeclarations::Discard => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.examples().map_or(true, IndexMap::is_empty)
    }
}

/// Types declared so far plus the example accumulator in use.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub types: Types,
    pub examples: ExampleDeclarations,
}

impl Declarations {
    pub fn new(types: Types, examples: ExampleDeclarations) -> Self {
        Self { types, examples }
    }

    /// Infer the pattern for a value found under `key`.
    ///
    /// Scalars record an example named after the key; objects become named
    /// types called after the key, renamed on collision with a different
    /// declaration of the same name.
    pub fn declare_value(&mut self, key: &str, value: &Value) -> Pattern {
        match value {
            Value::Null => Pattern::Null,
            Value::Boolean(_) | Value::Number(_) | Value::String(_) => {
                self.examples.add(key, value.to_literal());
                scalar_pattern(value)
            }
            Value::Object(object) => {
                let mut fields = IndexMap::with_capacity(object.len());
                for (field, field_value) in object {
                    let pattern = self.declare_value(field, field_value);
                    fields.insert(field.clone(), pattern);
                }
                self.declare_type(&capitalize(key), Pattern::Tabular(fields))
            }
            Value::List(items) => {
                let saved = std::mem::replace(&mut self.examples, ExampleDeclarations::Discard);
                let element = match items.first() {
                    Some(first) => self.declare_value(key, first),
                    None => Pattern::String,
                };
                self.examples = saved;
                Pattern::list(element)
            }
            Value::Xml(element) => Pattern::Xml(xml_pattern(element)),
        }
    }

    /// Register a named type, reusing an identical declaration.
    fn declare_type(&mut self, name: &str, pattern: Pattern) -> Pattern {
        let mut candidate = name.to_string();
        while let Some(existing) = self.types.get(&candidate) {
            if *existing == pattern {
                return Pattern::Deferred(candidate);
            }
            candidate.push('_');
        }
        self.types.insert(candidate.clone(), pattern);
        Pattern::Deferred(candidate)
    }
}

fn scalar_pattern(value: &Value) -> Pattern {
    match value {
        Value::Boolean(_) => Pattern::Boolean,
        Value::Number(_) => Pattern::Number,
        _ => Pattern::String,
    }
}

/// Text in XML is untyped; numbers and booleans are recognised by shape.
fn text_type(text: &str) -> Pattern {
    let trimmed = text.trim();
    if trimmed.parse::<f64>().is_ok() {
        Pattern::Number
    } else if trimmed == "true" || trimmed == "false" {
        Pattern::Boolean
    } else {
        Pattern::String
    }
}

fn xml_pattern(element: &XmlElement) -> crate::pattern::XmlPattern {
    crate::pattern::XmlPattern {
        name: element.name.clone(),
        attributes: element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), text_type(value)))
            .collect(),
        children: element
            .children
            .iter()
            .map(|child| match child {
                Value::Xml(nested) => Pattern::Xml(xml_pattern(nested)),
                other => text_type(&other.to_literal()),
            })
            .collect(),
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Type".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_name_appends_underscores() {
        let mut examples = ExampleDeclarations::default();
        examples.add("name", "a".into());
        examples.add("name", "b".into());
        let names: Vec<_> = examples.examples().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["name", "name_"]);
    }

    #[test]
    fn test_discard_keeps_nothing() {
        let mut examples = ExampleDeclarations::Discard;
        examples.add("name", "a".into());
        assert!(examples.is_empty());
    }

    #[test]
    fn test_objects_become_named_types() {
        let mut declarations = Declarations::default();
        let value = Value::parse_json(r#"{"id": 10, "address": {"city": "Pune"}}"#).unwrap();
        let pattern = declarations.declare_value("order", &value);

        assert_eq!(pattern, Pattern::deferred("Order"));
        assert!(declarations.types.contains_key("Address"));
        let examples = declarations.examples.examples().unwrap();
        assert_eq!(examples.get("id").map(String::as_str), Some("10"));
        assert_eq!(examples.get("city").map(String::as_str), Some("Pune"));
    }

    #[test]
    fn test_colliding_type_names_are_renamed() {
        let mut declarations = Declarations::default();
        let first = declarations.declare_value("body", &Value::parse_json(r#"{"a": 1}"#).unwrap());
        let same = declarations.declare_value("body", &Value::parse_json(r#"{"a": 2}"#).unwrap());
        let other = declarations.declare_value("body", &Value::parse_json(r#"{"b": "x"}"#).unwrap());
        assert_eq!(first, Pattern::deferred("Body"));
        assert_eq!(same, Pattern::deferred("Body"));
        assert_eq!(other, Pattern::deferred("Body_"));
    }

    #[test]
    fn test_lists_take_their_first_element_type_without_examples() {
        let mut declarations = Declarations::default();
        let pattern = declarations.declare_value("ids", &Value::parse_json("[1, 2]").unwrap());
        assert_eq!(pattern, Pattern::list(Pattern::Number));
        assert!(declarations.examples.is_empty());
    }
}
