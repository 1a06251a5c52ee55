//! Structural subtyping: does `this` accept every value `other` accepts?
//!
//! Named types are unfolded on demand. A pair of patterns already under
//! comparison higher up the recursion is assumed compatible, which is what
//! makes recursive types terminate.

use super::tabular::{declared, is_optional_key, key_name};
use super::xml::attribute_name;
use super::{Pattern, XmlPattern};
use crate::resolver::Resolver;
use crate::result::MatchResult;
use crate::value::Value;
use indexmap::IndexMap;

pub(super) struct Encompass<'r> {
    this_resolver: &'r Resolver,
    other_resolver: &'r Resolver,
    in_progress: Vec<(String, String)>,
}

impl<'r> Encompass<'r> {
    pub(super) fn new(this_resolver: &'r Resolver, other_resolver: &'r Resolver) -> Self {
        Self {
            this_resolver,
            other_resolver,
            in_progress: Vec::new(),
        }
    }

    pub(super) fn check(&mut self, this: &Pattern, other: &Pattern) -> MatchResult {
        match (this, other) {
            (_, Pattern::Deferred(name)) => match self.other_resolver.lookup(name) {
                Ok(resolved) => self.unfold(this, other, resolved, false),
                Err(error) => MatchResult::failure(error.to_string()),
            },
            (Pattern::Deferred(name), _) => match self.this_resolver.lookup(name) {
                Ok(resolved) => self.unfold(this, other, resolved, true),
                Err(error) => MatchResult::failure(error.to_string()),
            },
            (_, Pattern::Exact(value)) => self.this_resolver.matches_pattern(this, value),
            (Pattern::Optional(inner), Pattern::Optional(other_inner)) => {
                self.check(inner, other_inner)
            }
            (Pattern::Optional(_), Pattern::Null) => MatchResult::Success,
            (Pattern::Optional(inner), _) => self.check(inner, other),
            (_, Pattern::Optional(_)) => MatchResult::failure(format!(
                "expected {this}, got optional {}",
                other.type_name()
            )),
            (Pattern::Boolean, Pattern::Boolean)
            | (Pattern::Number, Pattern::Number)
            | (Pattern::String, Pattern::String)
            | (Pattern::String, Pattern::DateTime)
            | (Pattern::DateTime, Pattern::DateTime)
            | (Pattern::Null, Pattern::Null) => MatchResult::Success,
            (Pattern::String, Pattern::Regex(_)) => MatchResult::Success,
            (Pattern::Regex(regex), Pattern::Regex(other_regex)) if regex == other_regex => {
                MatchResult::Success
            }
            (Pattern::Tabular(fields), Pattern::Tabular(other_fields)) => {
                self.tabular(fields, other_fields)
            }
            (Pattern::List(inner), Pattern::List(other_inner)) => {
                self.check(inner, other_inner).breadcrumb("[]")
            }
            (Pattern::List(inner), Pattern::Array(elements)) => {
                for (index, element) in elements.iter().enumerate() {
                    let result = self.check(inner, element);
                    if result.is_failure() {
                        return result.breadcrumb(format!("[{index}]"));
                    }
                }
                MatchResult::Success
            }
            (Pattern::Array(elements), Pattern::Array(other_elements))
                if elements.len() == other_elements.len() =>
            {
                for (index, (element, other_element)) in
                    elements.iter().zip(other_elements).enumerate()
                {
                    let result = self.check(element, other_element);
                    if result.is_failure() {
                        return result.breadcrumb(format!("[{index}]"));
                    }
                }
                MatchResult::Success
            }
            (Pattern::Xml(xml), Pattern::Xml(other_xml)) => self.xml(xml, other_xml),
            _ => MatchResult::failure(format!("expected {}, got {}", this, other)),
        }
    }

    fn unfold(
        &mut self,
        this: &Pattern,
        other: &Pattern,
        resolved: &Pattern,
        this_side: bool,
    ) -> MatchResult {
        let key = (this.to_string(), other.to_string());
        if self.in_progress.contains(&key) {
            return MatchResult::Success;
        }
        self.in_progress.push(key);
        let result = if this_side {
            self.check(resolved, other)
        } else {
            self.check(this, resolved)
        };
        self.in_progress.pop();
        result
    }

    fn tabular(
        &mut self,
        fields: &IndexMap<String, Pattern>,
        other_fields: &IndexMap<String, Pattern>,
    ) -> MatchResult {
        for (key, pattern) in fields {
            let name = key_name(key);
            let result = match declared(other_fields, name) {
                Some((other_key, _)) if is_optional_key(other_key) && !is_optional_key(key) => {
                    MatchResult::failure(format!(
                        "Key named \"{name}\" is optional in the other pattern but required here"
                    ))
                }
                Some((_, other_pattern)) => self.check(pattern, other_pattern),
                None if is_optional_key(key) => MatchResult::Success,
                None => MatchResult::failure(format!("Expected key named \"{name}\" was missing")),
            };
            if result.is_failure() {
                return result.breadcrumb(name);
            }
        }
        MatchResult::Success
    }

    fn xml(&mut self, xml: &XmlPattern, other: &XmlPattern) -> MatchResult {
        if xml.name != other.name {
            return MatchResult::failure(format!(
                "expected element <{}>, got <{}>",
                xml.name, other.name
            ));
        }

        for (declared, pattern) in &xml.attributes {
            let name = attribute_name(declared);
            let other_attribute = other
                .attributes
                .iter()
                .find(|(other_declared, _)| attribute_name(other_declared) == name);
            let optional = declared.len() != name.len();
            let result = match other_attribute {
                Some((other_declared, _)) if other_declared.len() != name.len() && !optional => {
                    MatchResult::failure(format!(
                        "Attribute named \"{name}\" is optional in the other pattern but required here"
                    ))
                }
                Some((_, other_pattern)) => self.text(pattern, other_pattern),
                None if optional => MatchResult::Success,
                None => {
                    MatchResult::failure(format!("Expected attribute named \"{name}\" was missing"))
                }
            };
            if result.is_failure() {
                return result.breadcrumb(format!("@{name}")).breadcrumb(&xml.name);
            }
        }

        if xml.children.len() != other.children.len() {
            return MatchResult::failure(format!(
                "expected {} children, got {}",
                xml.children.len(),
                other.children.len()
            ))
            .breadcrumb(&xml.name);
        }
        for (child, other_child) in xml.children.iter().zip(&other.children) {
            let result = self.text(child, other_child);
            if result.is_failure() {
                return result.breadcrumb(&xml.name);
            }
        }
        MatchResult::Success
    }

    /// Literal XML text on the other side is parsed with this side's pattern.
    fn text(&mut self, this: &Pattern, other: &Pattern) -> MatchResult {
        match other {
            Pattern::Exact(Value::String(text)) => self.this_resolver.matches_text(this, text),
            _ => self.check(this, other),
        }
    }
}
