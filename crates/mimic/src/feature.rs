//! Features: scenarios sharing one dictionary of named types.
//!
//! Compilation runs in two passes over the Gherkin document. The first
//! collects every `type` declaration (background and scenarios alike) into
//! the feature's dictionary; the second compiles each scenario's clauses
//! against it. Named types are resolved at use time, so declarations may
//! appear in any order and may refer to each other.

use crate::error::{ContractError, NoMatchingScenario};
use crate::gherkin::{parse_document, ScenarioBlock, Step};
use crate::pattern::{parse_pattern, split_table_row, Examples, Pattern};
use crate::resolver::Types;
use crate::scenario::{
    AsyncMessage, HttpRequest, HttpResponse, MessagePattern, Scenario, UrlPattern,
};
use crate::value::is_pattern_token;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub scenarios: Vec<Scenario>,
    pub types: Arc<Types>,
}

impl Feature {
    /// Compile feature text.
    pub fn from_gherkin(text: &str) -> Result<Self, ContractError> {
        let document = parse_document(text)?;

        let mut types = Types::new();
        for step in document
            .background
            .iter()
            .chain(document.scenarios.iter().flat_map(|scenario| &scenario.steps))
        {
            if let Some(rest) = clause_argument(&step.text, "type") {
                let (name, pattern) = type_declaration(rest, step).map_err(|e| e.at_line(step.line))?;
                types.insert(name, pattern);
            }
        }
        let types = Arc::new(types);

        let mut scenarios = Vec::with_capacity(document.scenarios.len());
        for block in &document.scenarios {
            scenarios.push(compile_scenario(block, &document.background, &types)?);
        }

        for scenario in &scenarios {
            let mut names = Vec::new();
            collect_scenario_references(scenario, &mut names);
            if let Some(missing) = names.into_iter().find(|name| !types.contains_key(name)) {
                return Err(ContractError::UndeclaredType(missing));
            }
        }

        debug!(
            feature = %document.feature,
            scenarios = scenarios.len(),
            types = types.len(),
            "Compiled feature"
        );

        Ok(Self {
            name: document.feature,
            scenarios,
            types,
        })
    }

    /// Apply the strict-keys setting to every scenario.
    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        for scenario in &mut self.scenarios {
            scenario.strict_keys = strict;
        }
        self
    }

    pub fn http_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().filter(|scenario| scenario.is_http())
    }

    /// First scenario accepting the request, or why each one rejected it.
    pub fn matching_scenario(&self, request: &HttpRequest) -> Result<&Scenario, NoMatchingScenario> {
        let mut failures = Vec::new();
        for scenario in self.http_scenarios() {
            match scenario.matches_request(request).into_failure() {
                None => return Ok(scenario),
                Some(failure) => failures.push((scenario.name.clone(), failure)),
            }
        }
        Err(NoMatchingScenario::new(failures))
    }

    /// Generate the contract's response to a request.
    pub fn lookup_response(&self, request: &HttpRequest) -> Result<HttpResponse, NoMatchingScenario> {
        let mut failures = Vec::new();
        for scenario in self.http_scenarios() {
            match scenario.matches_request(request).into_failure() {
                None => match scenario.generate_response(request) {
                    Ok(response) => return Ok(response),
                    Err(error) => failures.push((
                        scenario.name.clone(),
                        crate::result::Failure::new(error.to_string()),
                    )),
                },
                Some(failure) => failures.push((scenario.name.clone(), failure)),
            }
        }
        Err(NoMatchingScenario::new(failures))
    }

    /// Index of the first scenario accepting a mock exchange.
    pub fn matching_mock(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<usize, NoMatchingScenario> {
        let mut failures = Vec::new();
        for (index, scenario) in self.scenarios.iter().enumerate() {
            if !scenario.is_http() {
                continue;
            }
            match scenario.matches_mock(request, response).into_failure() {
                None => return Ok(index),
                Some(failure) => failures.push((scenario.name.clone(), failure)),
            }
        }
        Err(NoMatchingScenario::new(failures))
    }

    /// Index of the first scenario whose message pattern accepts a message.
    pub fn matching_message(&self, message: &AsyncMessage) -> Result<usize, NoMatchingScenario> {
        let mut failures = Vec::new();
        for (index, scenario) in self.scenarios.iter().enumerate() {
            if scenario.message.is_none() {
                continue;
            }
            match scenario.matches_message(message).into_failure() {
                None => return Ok(index),
                Some(failure) => failures.push((scenario.name.clone(), failure)),
            }
        }
        Err(NoMatchingScenario::new(failures))
    }

    /// Every scenario expanded over its example rows.
    pub fn test_scenarios(&self) -> Result<Vec<Scenario>, ContractError> {
        let mut expanded = Vec::new();
        for scenario in &self.scenarios {
            expanded.extend(scenario.expand()?);
        }
        Ok(expanded)
    }
}

// ============================================================================
// Clause compilation
// ============================================================================

/// Text after a clause keyword, if the step starts with it.
fn clause_argument<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Split the first whitespace-delimited word from the rest.
fn first_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// Two-column `| key | pattern |` table as an object schema.
fn table_pattern(rows: &[String]) -> Result<Pattern, ContractError> {
    let mut fields = IndexMap::with_capacity(rows.len());
    for row in rows {
        let cells = split_table_row(row);
        if cells.len() != 2 {
            return Err(ContractError::MalformedTable {
                row: row.trim().to_string(),
                expected: 2,
                found: cells.len(),
            });
        }
        fields.insert(cells[0].clone(), parse_pattern(&cells[1])?);
    }
    Ok(Pattern::Tabular(fields))
}

/// The pattern given inline, as a table, or as a doc string.
fn step_pattern(inline: &str, step: &Step) -> Result<Pattern, ContractError> {
    if !step.table.is_empty() {
        return table_pattern(&step.table);
    }
    if let Some(doc) = &step.doc_string {
        return parse_pattern(doc);
    }
    parse_pattern(inline)
}

fn type_declaration(rest: &str, step: &Step) -> Result<(String, Pattern), ContractError> {
    let (name, inline) = first_word(rest);
    if name.is_empty() {
        return Err(ContractError::Unsupported("type declaration without a name".into()));
    }
    if inline.is_empty() && step.table.is_empty() && step.doc_string.is_none() {
        return Err(ContractError::Unsupported(format!("type {name} has no definition")));
    }
    Ok((name.to_string(), step_pattern(inline, step)?))
}

fn compile_scenario(
    block: &ScenarioBlock,
    background: &[Step],
    types: &Arc<Types>,
) -> Result<Scenario, ContractError> {
    let mut scenario = Scenario::new(block.name.clone(), Arc::clone(types));
    for step in background.iter().chain(&block.steps) {
        compile_clause(&mut scenario, step).map_err(|e| e.at_line(step.line))?;
    }
    for examples in &block.examples {
        scenario
            .examples
            .push(Examples::parse(&examples.rows).map_err(|e| e.at_line(examples.line))?);
    }
    Ok(scenario)
}

fn compile_clause(scenario: &mut Scenario, step: &Step) -> Result<(), ContractError> {
    let text = step.text.as_str();
    let (keyword, rest) = first_word(text);

    if HTTP_METHODS.contains(&keyword.to_uppercase().as_str()) && !rest.is_empty() {
        scenario.request.method = Some(keyword.to_uppercase());
        scenario.request.url = Some(UrlPattern::parse(rest)?);
        return Ok(());
    }

    match keyword {
        "type" => {}
        "request-header" => {
            let (name, pattern) = first_word(rest);
            scenario.request.headers.insert(name, parse_pattern(pattern)?);
        }
        "request-body" => scenario.request.body = Some(step_pattern(rest, step)?),
        "status" => {
            scenario.response.status = rest
                .parse()
                .map_err(|_| ContractError::parse("status code", rest))?;
        }
        "response-header" => {
            let (name, pattern) = first_word(rest);
            scenario.response.headers.insert(name, parse_pattern(pattern)?);
        }
        "response-body" => scenario.response.body = Some(step_pattern(rest, step)?),
        "message" => scenario.message = Some(message_clause(rest, step)?),
        _ => {
            return Err(ContractError::Unsupported(format!(
                "unrecognised clause \"{text}\""
            )))
        }
    }
    Ok(())
}

/// `message <channel> [<key-pattern>] <value-pattern>`
fn message_clause(rest: &str, step: &Step) -> Result<MessagePattern, ContractError> {
    let (channel, remainder) = first_word(rest);
    if channel.is_empty() {
        return Err(ContractError::Unsupported("message clause without a channel".into()));
    }
    let (first, after) = first_word(remainder);
    let (key, value) = if is_pattern_token(first) && !after.is_empty() {
        (Some(parse_pattern(first)?), step_pattern(after, step)?)
    } else {
        (None, step_pattern(remainder, step)?)
    };
    Ok(MessagePattern {
        channel: channel.to_string(),
        key,
        value,
    })
}

// ============================================================================
// Reference checking
// ============================================================================

fn collect_scenario_references(scenario: &Scenario, names: &mut Vec<String>) {
    for pattern in scenario.types.values() {
        pattern.collect_references(names);
    }
    if let Some(url) = &scenario.request.url {
        for segment in &url.segments {
            if let crate::scenario::PathSegment::Param { pattern, .. } = segment {
                pattern.collect_references(names);
            }
        }
        url.query.values().for_each(|p| p.collect_references(names));
    }
    let headers = scenario.request.headers.iter().chain(scenario.response.headers.iter());
    headers.for_each(|(_, p)| p.collect_references(names));
    for body in [&scenario.request.body, &scenario.response.body].into_iter().flatten() {
        body.collect_references(names);
    }
    if let Some(message) = &scenario.message {
        message.value.collect_references(names);
        if let Some(key) = &message.key {
            key.collect_references(names);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const MATH: &str = r#"
Feature: Math API

Scenario: Square of a number
  When POST /number
  And request-body (number)
  Then status 200
  And response-body (number)
"#;

    #[test]
    fn test_compiles_scenarios() {
        let feature = Feature::from_gherkin(MATH).unwrap();
        assert_eq!(feature.name, "Math API");
        let scenario = &feature.scenarios[0];
        assert_eq!(scenario.request.method.as_deref(), Some("POST"));
        assert_eq!(scenario.request.body, Some(Pattern::Number));
        assert_eq!(scenario.response.status, 200);
    }

    #[test]
    fn test_lookup_response_generates_from_contract() {
        let feature = Feature::from_gherkin(MATH).unwrap();
        let request = HttpRequest::new("POST", "/number").with_body(Value::string("10"));
        let response = feature.lookup_response(&request).unwrap();
        assert_eq!(response.status, 200);
        assert!(matches!(response.body, Value::Number(_)));
    }

    #[test]
    fn test_no_matching_scenario_names_each_candidate() {
        let feature = Feature::from_gherkin(MATH).unwrap();
        let request = HttpRequest::new("POST", "/wrong_path").with_body(Value::number(10));
        let error = feature.lookup_response(&request).unwrap_err();
        assert!(error.to_string().starts_with("In scenario \"Square of a number\""));
    }

    #[test]
    fn test_types_may_be_declared_after_use() {
        let text = r#"
Feature: Orders

Scenario: Get order
  When GET /orders/(id:number)
  Then status 200
  And response-body (Order)

Scenario: Types
  Given type Order
    | id       | (number)    |
    | customer | (Customer?) |
  And type Customer
    | name | (string) |
"#;
        let feature = Feature::from_gherkin(text).unwrap();
        assert_eq!(feature.types.len(), 2);
        let response = feature
            .lookup_response(&HttpRequest::new("GET", "/orders/7"))
            .unwrap();
        assert!(matches!(response.body, Value::Object(_)));
    }

    #[test]
    fn test_response_echoes_path_parameters() {
        let text = r#"
Feature: Orders

Scenario: Get order
  Given type Order
    | id   | (number) |
    | note | (string) |
  When GET /orders/(id:number)
  Then status 200
  And response-body (Order)
"#;
        let feature = Feature::from_gherkin(text).unwrap();
        let response = feature
            .lookup_response(&HttpRequest::new("GET", "/orders/42"))
            .unwrap();
        let Value::Object(body) = response.body else {
            panic!("expected object body");
        };
        assert_eq!(body["id"], Value::number(42));
    }

    #[test]
    fn test_undeclared_type_is_reported() {
        let text = "Feature: x\nScenario: y\n  When GET /a\n  Then status 200\n  And response-body (Missing)\n";
        assert!(matches!(
            Feature::from_gherkin(text),
            Err(ContractError::UndeclaredType(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_malformed_type_table_is_reported_with_line() {
        let text = "Feature: x\nScenario: y\n  Given type T\n    | id | (number) | extra |\n";
        let error = Feature::from_gherkin(text).unwrap_err();
        assert!(error.to_string().starts_with("line 3:"), "{error}");
    }

    #[test]
    fn test_unrecognised_clause_is_an_error() {
        let text = "Feature: x\nScenario: y\n  When frobnicate\n";
        assert!(matches!(
            Feature::from_gherkin(text),
            Err(ContractError::Compile { line: 3, .. })
        ));
    }

    #[test]
    fn test_background_applies_to_every_scenario() {
        let text = r#"
Feature: Headers

Background:
  Given request-header X-Tenant (string)

Scenario: One
  When GET /one
  Then status 200

Scenario: Two
  When GET /two
  Then status 200
"#;
        let feature = Feature::from_gherkin(text).unwrap();
        assert!(feature.scenarios.iter().all(|s| !s.request.headers.is_empty()));
        let missing = HttpRequest::new("GET", "/one");
        assert!(feature.matching_scenario(&missing).is_err());
        let present = HttpRequest::new("GET", "/one").with_header("x-tenant", "acme");
        assert_eq!(feature.matching_scenario(&present).unwrap().name, "One");
    }

    #[test]
    fn test_examples_expand_into_concrete_scenarios() {
        let text = r#"
Feature: Orders

Scenario Outline: Create order
  When POST /orders
  And request-body
    | id   | (number) |
    | qty? | (number) |
  Then status 201

  Examples:
    | id |
    | 10 |
    | 20 |
"#;
        let feature = Feature::from_gherkin(text).unwrap();
        let scenarios = feature.test_scenarios().unwrap();
        assert_eq!(scenarios.len(), 2);
        for (scenario, id) in scenarios.iter().zip([10, 20]) {
            let request = scenario.generate_request().unwrap();
            let Value::Object(body) = request.body else {
                panic!("expected object body");
            };
            assert_eq!(body["id"], Value::number(id));
        }
    }

    #[test]
    fn test_optional_fields_do_not_multiply_example_scenarios() {
        let text = r#"
Feature: Notes

Scenario Outline: Create note
  When POST /notes
  And request-body
    | id     | (number) |
    | title? | (string) |
    | body?  | (string) |
    | tag?   | (string) |
  Then status 201

  Examples:
    | id |
    | 1  |
"#;
        let feature = Feature::from_gherkin(text).unwrap();
        let scenarios = feature.test_scenarios().unwrap();
        assert_eq!(scenarios.len(), 1);
        let Some(Pattern::Tabular(fields)) = &scenarios[0].request.body else {
            panic!("expected tabular body");
        };
        assert_eq!(fields["id"], Pattern::Exact(Value::number(1)));
        assert_eq!(fields["tag?"], Pattern::String);
    }

    #[test]
    fn test_message_clause_with_key() {
        let text = "Feature: x\nScenario: y\n  Then message orders (string) {\"id\": \"(number)\"}\n";
        let feature = Feature::from_gherkin(text).unwrap();
        let message = feature.scenarios[0].message.as_ref().unwrap();
        assert_eq!(message.channel, "orders");
        assert_eq!(message.key, Some(Pattern::String));
        assert!(matches!(message.value, Pattern::Tabular(_)));
    }
}
