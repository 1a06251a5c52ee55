//! Tests for the stub engine.
//!
//! This module covers:
//! - Static expectations loaded from mocks, and their rejection
//! - Dynamic registration and last-wins override
//! - Contract fallback and the fallthrough response
//! - XML request bodies in mocks
//! - Message mocks

use super::*;
use crate::feature::Feature;
use crate::scenario::{AsyncMessage, HttpRequest, HttpResponse, MIMIC_RESULT_HEADER};
use crate::value::Value;

const SQUARE: &str = r#"
Feature: Math API

Scenario: Square of a number
  When POST /number
  And request-body (number)
  Then status 200
  And response-body (number)
"#;

const GET_NUMBER: &str = r#"
Feature: Math API

Scenario: Get a number
  When GET /number
  Then status 200
  And response-body (number)
"#;

fn contract(text: &str) -> Contract {
    Contract::new("math.contract", Feature::from_gherkin(text).unwrap())
}

fn stub(text: &str, mocks: Vec<Mock>) -> ContractStub {
    let mocks = mocks
        .into_iter()
        .enumerate()
        .map(|(i, mock)| MockSource::new(format!("mock{i}.json"), mock))
        .collect();
    ContractStub::new(vec![contract(text)], mocks, UnmatchedMockPolicy::Warn).unwrap()
}

fn xml_stub(body_clause: &str, mock_body: &str) -> ContractStub {
    let text = format!(
        "Feature: Number\nScenario: Accept a number\n  When POST /number\n  And request-body {body_clause}\n  Then status 200\n"
    );
    let request = HttpRequest::new("POST", "/number").with_body(Value::parse_body(mock_body));
    stub(&text, vec![Mock::http(request, HttpResponse::new(200))])
}

fn post(path: &str, body: &str) -> HttpRequest {
    HttpRequest::new("POST", path).with_body(Value::parse_body(body))
}

// ============================================================================
// Static expectations
// ============================================================================

#[test]
fn test_serves_mocked_data_before_contract() {
    let mock = Mock::http(
        HttpRequest::new("POST", "/number").with_body(Value::number(10)),
        HttpResponse::ok(Value::string("100")),
    );
    let stub = stub(SQUARE, vec![mock]);

    let (response, source) = stub.resolve(&post("/number", "10"));
    assert_eq!(source, MatchSource::StaticExpectation);
    assert_eq!(response.body_text(), "100");

    let (response, source) = stub.resolve(&post("/number", "11"));
    assert_eq!(source, MatchSource::Contract);
    assert_eq!(response.status, 200);
    assert!(matches!(response.body, Value::Number(_)));
}

#[test]
fn test_mock_matching_no_contract_is_dropped_with_diagnostic() {
    let mock = Mock::http(
        HttpRequest::new("POST", "/number").with_body(Value::string("ten")),
        HttpResponse::ok(Value::number(100)),
    );
    let stub = stub(SQUARE, vec![mock]);

    assert_eq!(stub.registry().static_count(), 0);
    let diagnostics = stub.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].starts_with("mock0.json didn't match math.contract\n"));
    assert!(diagnostics[0].contains("In scenario \"Square of a number\""));

    let (_, source) = stub.resolve(&post("/number", "ten"));
    assert_eq!(source, MatchSource::Fallthrough);
}

#[test]
fn test_reject_policy_aborts_construction() {
    let mock = Mock::http(
        HttpRequest::new("GET", "/elsewhere"),
        HttpResponse::ok(Value::number(1)),
    );
    let result = ContractStub::new(
        vec![contract(SQUARE)],
        vec![MockSource::new("stray.json", mock)],
        UnmatchedMockPolicy::Reject,
    );
    let Err(RegistrationError::NoMatchingScenario(reports)) = result else {
        panic!("expected the stray mock to be rejected");
    };
    assert!(reports[0].starts_with("stray.json didn't match math.contract"));
}

#[test]
fn test_datetime_token_in_mock_matches_datetime_values() {
    let text = "Feature: Calendar\nScenario: Accept a date\n  When POST /date\n  And request-body\n    | date | (datetime) |\n  Then status 200\n  And response-body (string)\n";
    let mock = Mock::http(
        HttpRequest::new("POST", "/date").with_body(Value::parse_json(r#"{"date": "(datetime)"}"#).unwrap()),
        HttpResponse::ok(Value::string("done")),
    );
    let stub = stub(text, vec![mock]);

    let (response, source) = stub.resolve(&post("/date", r#"{"date": "2020-04-12T00:00:00"}"#));
    assert_eq!(source, MatchSource::StaticExpectation);
    assert_eq!(response.body_text(), "done");

    let (response, source) = stub.resolve(&post("/date", "2020-04-12T00:00:00"));
    assert_eq!(source, MatchSource::Fallthrough);
    assert_eq!(response.status, 400);
}

// ============================================================================
// Dynamic expectations
// ============================================================================

#[test]
fn test_last_dynamic_mock_overrides_earlier_ones() {
    let stub = stub(GET_NUMBER, vec![]);
    let get = HttpRequest::new("GET", "/number");

    for body in [10, 20] {
        let mock = Mock::parse(&format!(
            r#"{{"http-request": {{"method": "GET", "path": "/number"}}, "http-response": {{"status": 200, "body": {body}}}}}"#
        ))
        .unwrap();
        stub.register(mock).unwrap();

        let (response, source) = stub.resolve(&get);
        assert_eq!(source, MatchSource::DynamicExpectation);
        assert_eq!(response.body_text(), body.to_string());
    }
    assert_eq!(stub.registry().dynamic_count(), 2);
}

#[test]
fn test_dynamic_mock_beats_static_mock() {
    let static_mock = Mock::http(HttpRequest::new("GET", "/number"), HttpResponse::ok(Value::number(1)));
    let stub = stub(GET_NUMBER, vec![static_mock]);
    stub.register(Mock::http(
        HttpRequest::new("GET", "/number"),
        HttpResponse::ok(Value::number(2)),
    ))
    .unwrap();

    let (response, source) = stub.resolve(&HttpRequest::new("GET", "/number"));
    assert_eq!(source, MatchSource::DynamicExpectation);
    assert_eq!(response.body, Value::number(2));
}

#[test]
fn test_registration_outside_the_contract_is_rejected() {
    let stub = stub(GET_NUMBER, vec![]);
    let err = stub
        .register(Mock::http(
            HttpRequest::new("GET", "/number"),
            HttpResponse::ok(Value::string("not a number")),
        ))
        .unwrap_err();
    assert!(err.to_string().contains("RESPONSE.body"), "{err}");
    assert_eq!(stub.registry().dynamic_count(), 0);
}

#[test]
fn test_recorded_query_params_are_required() {
    let text = "Feature: Orders\nScenario: List orders\n  When GET /orders?status=(string)\n  Then status 200\n  And response-body (string)\n";
    let mock = Mock::http(
        HttpRequest::new("GET", "/orders?status=open"),
        HttpResponse::ok(Value::string("OPEN-ONLY")),
    );
    let stub = stub(text, vec![mock]);
    assert_eq!(stub.registry().static_count(), 1);

    let (response, source) = stub.resolve(&HttpRequest::new("GET", "/orders?status=open"));
    assert_eq!(source, MatchSource::StaticExpectation);
    assert_eq!(response.body_text(), "OPEN-ONLY");

    let (_, source) = stub.resolve(&HttpRequest::new("GET", "/orders"));
    assert_eq!(source, MatchSource::Contract);
}

#[test]
fn test_typed_tokens_in_mock_response_are_generated() {
    let stub = stub(GET_NUMBER, vec![]);
    stub.register(Mock::http(
        HttpRequest::new("GET", "/number"),
        HttpResponse::ok(Value::string("(number)")),
    ))
    .unwrap();
    let (response, _) = stub.resolve(&HttpRequest::new("GET", "/number"));
    assert!(matches!(response.body, Value::Number(_)));
}

// ============================================================================
// Contract responses
// ============================================================================

#[test]
fn test_path_binding_with_many_optional_fields_is_served() {
    let mut text = String::from("Feature: Profiles\nBackground:\n  Given type Profile\n    | id | (number) |\n");
    for index in 0..24 {
        text.push_str(&format!("    | f{index}? | (string) |\n"));
    }
    text.push_str("Scenario: Fetch a profile\n  When GET /profiles/(id:number)\n  Then status 200\n  And response-body (Profile)\n");
    let stub = stub(&text, vec![]);

    let (response, source) = stub.resolve(&HttpRequest::new("GET", "/profiles/7"));
    assert_eq!(source, MatchSource::Contract);
    let Value::Object(body) = response.body else {
        panic!("expected object body");
    };
    assert_eq!(body["id"], Value::number(7));
    assert_eq!(body.len(), 25);
}

#[test]
fn test_encoded_path_binding_is_echoed_decoded() {
    let text = "Feature: Greetings\nBackground:\n  Given type Greeting\n    | name | (string) |\nScenario: Greet\n  When GET /greet/(name:string)\n  Then status 200\n  And response-body (Greeting)\n";
    let stub = stub(text, vec![]);

    let (response, _) = stub.resolve(&HttpRequest::new("GET", "/greet/John%20Doe"));
    let Value::Object(body) = response.body else {
        panic!("expected object body");
    };
    assert_eq!(body["name"], Value::string("John Doe"));
}

// ============================================================================
// Fallthrough
// ============================================================================

#[test]
fn test_unrecognised_path_falls_through() {
    let stub = ContractStub::new(
        vec![contract(SQUARE), contract(SQUARE)],
        vec![],
        UnmatchedMockPolicy::Warn,
    )
    .unwrap();

    let (response, source) = stub.resolve(&post("/wrong_path", "10"));
    assert_eq!(source, MatchSource::Fallthrough);
    assert!(!source.is_match());
    assert_eq!(response.status, 400);
    assert_eq!(response.header(MIMIC_RESULT_HEADER), Some("failure"));
    assert_eq!(response.body_text(), PATH_NOT_RECOGNISED);
}

#[test]
fn test_unrecognised_path_wins_over_method_mismatch() {
    let stub = stub(GET_NUMBER, vec![]);
    let (response, source) = stub.resolve(&post("/wrong_path", "10"));
    assert_eq!(source, MatchSource::Fallthrough);
    assert_eq!(response.body_text(), PATH_NOT_RECOGNISED);

    let (response, _) = stub.resolve(&post("/number", "10"));
    assert!(response.body_text().contains("expected method GET, got POST"));
}

#[test]
fn test_body_mismatch_reports_each_scenario() {
    let stub = stub(SQUARE, vec![]);
    let (response, _) = stub.resolve(&post("/number", "ten"));
    assert!(response.is_stub_failure());
    assert!(response
        .body_text()
        .starts_with("In scenario \"Square of a number\": body"));
}

#[test]
fn test_no_contracts_still_answers() {
    let stub = ContractStub::new(vec![], vec![], UnmatchedMockPolicy::Warn).unwrap();
    let (response, source) = stub.resolve(&HttpRequest::new("GET", "/"));
    assert_eq!(source, MatchSource::Fallthrough);
    assert!(response.is_stub_failure());
}

// ============================================================================
// XML bodies
// ============================================================================

#[test]
fn test_stub_xml_body() {
    let stub = xml_stub("<data>(number)</data>", "<data>10</data>");
    let (response, source) = stub.resolve(&post("/number", "<data>10</data>"));
    assert_eq!(source, MatchSource::StaticExpectation);
    assert_eq!(response.status, 200);
}

#[test]
fn test_stub_xml_optional_number_with_value_and_type() {
    let stub = xml_stub("<data>(number?)</data>", "<data>10</data>");
    assert_eq!(stub.resolve(&post("/number", "<data>10</data>")).1, MatchSource::StaticExpectation);

    let stub = xml_stub("<data>(number?)</data>", "<data>(number)</data>");
    assert_eq!(stub.resolve(&post("/number", "<data>10</data>")).1, MatchSource::StaticExpectation);
}

#[test]
fn test_xml_value_mismatch_falls_back_to_contract() {
    let stub = xml_stub("<data>(number?)</data>", "<data>10</data>");
    let (response, source) = stub.resolve(&post("/number", "<data>20</data>"));
    assert_eq!(source, MatchSource::Contract);
    assert_eq!(response.status, 200);
}

#[test]
fn test_stub_xml_optional_number_with_empty_node() {
    let stub = xml_stub("<data>(number?)</data>", "<data></data>");
    assert_eq!(stub.resolve(&post("/number", "<data/>")).1, MatchSource::StaticExpectation);
}

#[test]
fn test_stub_xml_attributes() {
    let stub = xml_stub(r#"<data number="(number)"/>"#, r#"<data number="(number)"/>"#);
    assert_eq!(stub.registry().static_count(), 1);
    assert_eq!(
        stub.resolve(&post("/number", r#"<data number="10"/>"#)).1,
        MatchSource::StaticExpectation
    );

    let stub = xml_stub(r#"<data number.opt="(number)"/>"#, "<data/>");
    assert_eq!(stub.registry().static_count(), 1);
    assert_eq!(stub.resolve(&post("/number", "<data/>")).1, MatchSource::StaticExpectation);
}

// ============================================================================
// Messages
// ============================================================================

#[test]
fn test_message_mocks_are_kept_per_channel() {
    let text = "Feature: Orders\nScenario: Order placed\n  * message orders (string) (number)\n";
    let stub = stub(text, vec![]);

    let accepted = AsyncMessage {
        channel: "orders".to_string(),
        key: Some(Value::string("k1")),
        value: Value::number(1),
    };
    stub.register(Mock::Message(accepted.clone())).unwrap();

    let rejected = AsyncMessage {
        value: Value::string("one"),
        ..accepted.clone()
    };
    assert!(stub.register(Mock::Message(rejected)).is_err());

    assert_eq!(stub.messages("orders"), vec![accepted]);
    assert!(stub.messages("payments").is_empty());
}
