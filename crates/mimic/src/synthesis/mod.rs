//! Contract text from concrete exchanges.
//!
//! The inverse of compilation: values are turned into pattern references,
//! object shapes into `type` declarations, and literals into an Examples
//! row, then rendered as Gherkin clauses grouped by section.

mod declarations;

pub use declarations::{Declarations, ExampleDeclarations};
pub use crate::gherkin::GherkinSection;

use crate::error::ContractError;
use crate::pattern::{escape_cell, Pattern};
use crate::resolver::Types;
use crate::scenario::{HttpRequest, HttpResponse};
use crate::value::Value;
use indexmap::IndexMap;

const REQUEST_BODY_TYPE: &str = "RequestBody";

/// One clause, before keywords are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GherkinClause {
    pub content: String,
    pub section: GherkinSection,
}

impl GherkinClause {
    pub fn new(content: impl Into<String>, section: GherkinSection) -> Self {
        Self {
            content: content.into(),
            section,
        }
    }
}

/// `request-body` clause; literals are recorded as examples.
pub fn request_body_clauses(body: &Value, declarations: &mut Declarations) -> Vec<GherkinClause> {
    if body.is_empty() {
        return Vec::new();
    }
    let pattern = declarations.declare_value(REQUEST_BODY_TYPE, body);
    vec![GherkinClause::new(format!("request-body {pattern}"), GherkinSection::When)]
}

/// `response-body` clause; the body is declared as `type_name` and its
/// literals are not kept as examples.
pub fn response_body_clauses(type_name: &str, body: &Value, types: Types) -> (Vec<GherkinClause>, Types) {
    if body.is_empty() {
        return (Vec::new(), types);
    }
    let mut declarations = Declarations::new(types, ExampleDeclarations::Discard);
    let pattern = declarations.declare_value(type_name, body);
    let clause = GherkinClause::new(format!("response-body {pattern}"), GherkinSection::Then);
    (vec![clause], declarations.types)
}

/// One clause per header, in the map's order.
pub fn header_clauses(
    headers: &IndexMap<String, String>,
    keyword: &str,
    section: GherkinSection,
    declarations: &mut Declarations,
) -> Vec<GherkinClause> {
    headers
        .iter()
        .map(|(name, value)| {
            let pattern = declarations.declare_value(name, &Value::string(value.clone()));
            GherkinClause::new(format!("{keyword} {name} {pattern}"), section)
        })
        .collect()
}

/// `type` declarations with their field tables.
pub fn type_clauses(types: &Types) -> Result<Vec<GherkinClause>, ContractError> {
    types
        .iter()
        .map(|(name, pattern)| {
            let Pattern::Tabular(fields) = pattern else {
                return Err(ContractError::Unsupported(format!(
                    "Type not recognised: {pattern}"
                )));
            };
            let table: Vec<String> = fields
                .iter()
                .map(|(key, field)| {
                    format!("  | {} | {} |", escape_cell(key), escape_cell(&field.to_string()))
                })
                .collect();
            Ok(GherkinClause::new(
                format!("type {name}\n{}", table.join("\n")),
                GherkinSection::Given,
            ))
        })
        .collect()
}

/// Render clauses as a scenario: sections in Given, When, Then, `*` order,
/// continuation clauses keyed `And`, then the Examples table if any.
pub fn to_gherkin_scenario(name: &str, clauses: &[GherkinClause], examples: &ExampleDeclarations) -> String {
    let mut statements = Vec::new();
    for section in [
        GherkinSection::Given,
        GherkinSection::When,
        GherkinSection::Then,
        GherkinSection::Star,
    ] {
        let in_section = clauses.iter().filter(|clause| clause.section == section);
        for (index, clause) in in_section.enumerate() {
            let keyword = if index == 0 { section.keyword() } else { "And" };
            statements.push(format!("{keyword} {}", clause.content));
        }
    }

    let mut body = statements.join("\n");
    if let Some(rows) = examples.examples().filter(|rows| !rows.is_empty()) {
        body.push_str("\n\n");
        body.push_str(&examples_table(rows));
    }

    format!("Scenario: {name}\n{}\n", indent(&body))
}

pub fn to_gherkin_feature(name: &str, scenarios: &[String]) -> String {
    format!("Feature: {name}\n{}\n", indent(&scenarios.join("\n")))
}

fn examples_table(rows: &IndexMap<String, String>) -> String {
    let heading: Vec<String> = rows.keys().map(|key| escape_cell(key)).collect();
    let values: Vec<String> = rows.values().map(|value| escape_cell(value)).collect();
    format!(
        "Examples:\n| {} |\n| {} |",
        heading.join(" | "),
        values.join(" | ")
    )
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Synthesise one scenario from a request/response pair.
///
/// `types` carries the declarations of earlier scenarios of the same
/// feature so names stay unique across it; it is returned updated.
pub fn scenario_from_exchange(
    name: &str,
    request: &HttpRequest,
    response: &HttpResponse,
    types: Types,
) -> Result<(String, Types), ContractError> {
    let known: Vec<String> = types.keys().cloned().collect();
    let mut declarations = Declarations::new(types, ExampleDeclarations::default());

    let mut url = request.path.clone();
    for (index, (param, value)) in request.query.iter().enumerate() {
        let pattern = declarations.declare_value(param, &Value::string(value.clone()));
        url.push(if index == 0 { '?' } else { '&' });
        url.push_str(&format!("{param}={pattern}"));
    }
    let mut clauses = vec![GherkinClause::new(
        format!("{} {url}", request.method),
        GherkinSection::When,
    )];
    clauses.extend(header_clauses(
        &request.headers,
        "request-header",
        GherkinSection::When,
        &mut declarations,
    ));
    clauses.extend(request_body_clauses(&request.body, &mut declarations));
    clauses.push(GherkinClause::new(
        format!("status {}", response.status),
        GherkinSection::Then,
    ));

    let Declarations { types, examples } = declarations;
    let mut response_declarations = Declarations::new(types, ExampleDeclarations::Discard);
    clauses.extend(header_clauses(
        &response.headers,
        "response-header",
        GherkinSection::Then,
        &mut response_declarations,
    ));
    let (body_clauses, types) =
        response_body_clauses("ResponseBody", &response.body, response_declarations.types);
    clauses.extend(body_clauses);

    let new_types: Types = types
        .iter()
        .filter(|(name, _)| !known.contains(name))
        .map(|(name, pattern)| (name.clone(), pattern.clone()))
        .collect();
    let mut all_clauses = type_clauses(&new_types)?;
    all_clauses.extend(clauses);

    Ok((to_gherkin_scenario(name, &all_clauses, &examples), types))
}
