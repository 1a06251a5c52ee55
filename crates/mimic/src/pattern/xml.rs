//! XML element patterns.
//!
//! Attribute names ending in `.opt` are optional. Attribute values and text
//! children are untyped text on the wire, so they are parsed with their
//! pattern before matching.

use super::{Pattern, Row};
use crate::error::ContractError;
use crate::resolver::Resolver;
use crate::result::MatchResult;
use crate::value::{write_fragment, Value, XmlElement};
use indexmap::IndexMap;
use std::fmt;
use sxd_document::dom::{Document, Element};
use sxd_document::Package;

const OPTIONAL_ATTRIBUTE_SUFFIX: &str = ".opt";

/// The attribute name without its optionality marker.
pub fn attribute_name(name: &str) -> &str {
    name.strip_suffix(OPTIONAL_ATTRIBUTE_SUFFIX).unwrap_or(name)
}

fn is_optional_attribute(name: &str) -> bool {
    name.ends_with(OPTIONAL_ATTRIBUTE_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlPattern {
    pub name: String,
    pub attributes: IndexMap<String, Pattern>,
    /// `Pattern::Xml` for nested elements, anything else for text.
    pub children: Vec<Pattern>,
}

impl XmlPattern {
    /// Build a pattern from a parsed element; text is read as pattern syntax.
    pub fn from_element(element: &XmlElement) -> Self {
        let attributes = element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), super::syntax::text_pattern(value)))
            .collect();
        let children = element
            .children
            .iter()
            .map(|child| match child {
                Value::Xml(nested) => Pattern::Xml(XmlPattern::from_element(nested)),
                Value::String(text) => super::syntax::text_pattern(text),
                other => Pattern::Exact(other.clone()),
            })
            .collect();
        Self {
            name: element.name.clone(),
            attributes,
            children,
        }
    }

    pub(super) fn matches(&self, element: &XmlElement, resolver: &Resolver) -> MatchResult {
        if element.name != self.name {
            return MatchResult::failure(format!(
                "expected element <{}>, got <{}>",
                self.name, element.name
            ));
        }

        for (declared, pattern) in &self.attributes {
            let name = attribute_name(declared);
            let result = match element.attributes.get(name) {
                Some(text) => resolver.matches_text(pattern, text),
                None if is_optional_attribute(declared) => MatchResult::Success,
                None => match resolver.matches_pattern(pattern, &Value::Null) {
                    MatchResult::Success => MatchResult::Success,
                    MatchResult::Failure(_) => MatchResult::failure(format!(
                        "Expected attribute named \"{name}\" was missing"
                    )),
                },
            };
            if result.is_failure() {
                return result.breadcrumb(format!("@{name}")).breadcrumb(&self.name);
            }
        }

        if element.children.len() > self.children.len() {
            return MatchResult::failure(format!(
                "expected {} children, got {}",
                self.children.len(),
                element.children.len()
            ))
            .breadcrumb(&self.name);
        }

        for (index, pattern) in self.children.iter().enumerate() {
            let result = match element.children.get(index) {
                Some(Value::String(text)) => resolver.matches_text(pattern, text),
                Some(child) => resolver.matches_pattern(pattern, child),
                None => resolver.matches_pattern(pattern, &Value::Null),
            };
            if result.is_failure() {
                return result.breadcrumb(&self.name);
            }
        }

        MatchResult::Success
    }

    pub(super) fn generate_with(
        &self,
        resolver: &Resolver,
        stack: &mut Vec<String>,
    ) -> Result<XmlElement, ContractError> {
        let mut element = XmlElement::new(self.name.clone());
        for (declared, pattern) in &self.attributes {
            match pattern.generate_with(resolver, stack)? {
                Value::Null => {}
                value => {
                    element
                        .attributes
                        .insert(attribute_name(declared).to_string(), value.to_literal());
                }
            }
        }
        for pattern in &self.children {
            let child = match pattern.generate_with(resolver, stack) {
                Err(ContractError::RecursiveType(_)) if pattern.is_optional() => continue,
                other => other?,
            };
            match child {
                Value::Null => {}
                Value::Xml(nested) => element.children.push(Value::Xml(nested)),
                text => element.children.push(Value::String(text.to_literal())),
            }
        }
        Ok(element)
    }

    /// Attributes named like a row column become exact values.
    pub(super) fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<Self, ContractError> {
        let mut attributes = IndexMap::with_capacity(self.attributes.len());
        for (declared, pattern) in &self.attributes {
            let name = attribute_name(declared);
            match row.get(name) {
                Some(literal) => {
                    let value = pattern.parse(literal, resolver)?;
                    attributes.insert(name.to_string(), Pattern::Exact(value));
                }
                None => {
                    attributes.insert(declared.clone(), pattern.clone());
                }
            }
        }
        Ok(Self {
            name: self.name.clone(),
            attributes,
            children: self.children.clone(),
        })
    }
}

impl XmlPattern {
    fn to_dom<'d>(&self, document: &Document<'d>) -> Element<'d> {
        let element = document.create_element(self.name.as_str());
        for (name, pattern) in &self.attributes {
            element.set_attribute_value(name.as_str(), &pattern.to_string());
        }
        for child in &self.children {
            match child {
                Pattern::Xml(nested) => {
                    element.append_child(nested.to_dom(document));
                }
                other => {
                    element.append_child(document.create_text(&other.to_string()));
                }
            }
        }
        element
    }
}

impl fmt::Display for XmlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let package = Package::new();
        let document = package.as_document();
        document.root().append_child(self.to_dom(&document));
        f.write_str(&write_fragment(&document))
    }
}
