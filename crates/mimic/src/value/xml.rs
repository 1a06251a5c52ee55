//! XML element values.
//!
//! Parsing and writing go through `sxd_document`; only elements, attributes
//! and non-blank text survive. Comments and processing instructions are dropped.

use super::Value;
use crate::error::ContractError;
use indexmap::IndexMap;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Document, Element};
use sxd_document::{parser, writer, Package};

/// An XML element: name, attributes, and ordered children.
///
/// Children are `Value::Xml` for nested elements and `Value::String` for text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Value>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Value) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a document and return its root element.
    pub fn parse(text: &str) -> Result<Self, ContractError> {
        let package = parser::parse(text).map_err(|e| ContractError::Xml(format!("{e:?}")))?;
        let document = package.as_document();
        document
            .root()
            .children()
            .into_iter()
            .find_map(|child| match child {
                ChildOfRoot::Element(element) => Some(from_dom(element)),
                _ => None,
            })
            .ok_or_else(|| ContractError::Xml("document has no root element".to_string()))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn to_xml_string(&self) -> String {
        let package = Package::new();
        let document = package.as_document();
        document.root().append_child(self.to_dom(&document));
        write_fragment(&document)
    }

    fn to_dom<'d>(&self, document: &Document<'d>) -> Element<'d> {
        let element = document.create_element(self.name.as_str());
        for (name, value) in &self.attributes {
            element.set_attribute_value(name.as_str(), value);
        }
        for child in &self.children {
            match child {
                Value::Xml(nested) => {
                    element.append_child(nested.to_dom(document));
                }
                other => {
                    element.append_child(document.create_text(&other.to_literal()));
                }
            }
        }
        element
    }
}

/// Serialize a document without its `<?xml ...?>` declaration.
pub(crate) fn write_fragment(document: &Document<'_>) -> String {
    let mut out = Vec::new();
    if let Err(error) = writer::format_document(document, &mut out) {
        tracing::warn!(%error, "failed to serialize XML document");
    }
    let text = String::from_utf8_lossy(&out);
    match text.strip_prefix("<?xml").and_then(|rest| rest.split_once("?>")) {
        Some((_, body)) => body.trim_start().to_string(),
        None => text.into_owned(),
    }
}

fn from_dom(element: Element<'_>) -> XmlElement {
    let attributes = element
        .attributes()
        .iter()
        .map(|attribute| {
            (
                attribute.name().local_part().to_string(),
                attribute.value().to_string(),
            )
        })
        .collect();

    let children = element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(nested) => Some(Value::Xml(from_dom(nested))),
            ChildOfElement::Text(text) => {
                let content = text.text().trim();
                (!content.is_empty()).then(|| Value::String(content.to_string()))
            }
            _ => None,
        })
        .collect();

    XmlElement {
        name: element.name().local_part().to_string(),
        attributes,
        children,
    }
}
