//! Integration tests for the stub server over real HTTP.
//!
//! Each test binds a stub to an ephemeral port and drives it with reqwest.

use mimic::loader::load_stub;
use mimic::config::StubConfig;
use mimic::scenario::MIMIC_RESULT_HEADER;
use mimic::stub::{serve, Contract, ContractStub, RunningStub, UnmatchedMockPolicy, EXPECTATIONS_PATH};
use mimic::Feature;
use reqwest::Client;
use std::sync::Arc;

const MATH: &str = r#"
Feature: Math API

Scenario: Square of a number
  When POST /number
  And request-body (number)
  Then status 200
  And response-body (number)

Scenario: Get a number
  When GET /number
  Then status 200
  And response-body (number)
"#;

const ORDERS: &str = r#"
Feature: Orders

Background:
  Given type Order
    | id     | (number) |
    | status | (string) |

Scenario: Fetch an order
  When GET /orders/(id:number)
  Then status 200
  And response-header Content-Type application/json
  And response-body (Order)
"#;

async fn start(contract: &str) -> RunningStub {
    let feature = Feature::from_gherkin(contract).unwrap();
    let stub = ContractStub::new(
        vec![Contract::new("test.contract", feature)],
        vec![],
        UnmatchedMockPolicy::Warn,
    )
    .unwrap();
    serve(Arc::new(stub), "127.0.0.1", 0).await.unwrap()
}

async fn register(client: &Client, stub: &RunningStub, mock: &str) -> reqwest::Response {
    client
        .post(format!("{}{EXPECTATIONS_PATH}", stub.url()))
        .header("Content-Type", "application/json")
        .body(mock.to_string())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_contract_generates_a_response() {
    let stub = start(MATH).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/number", stub.url()))
        .body("10")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().get(MIMIC_RESULT_HEADER).is_none());
    let body = response.text().await.unwrap();
    assert!(body.parse::<f64>().is_ok(), "not a number: {body}");

    stub.shutdown().await;
}

#[tokio::test]
async fn test_dynamic_expectations_over_http_last_wins() {
    let stub = start(MATH).await;
    let client = Client::new();

    for value in ["10", "20"] {
        let mock = format!(
            r#"{{"http-request": {{"method": "GET", "path": "/number"}}, "http-response": {{"status": 200, "body": {value}}}}}"#
        );
        assert_eq!(register(&client, &stub, &mock).await.status(), 200);

        let body = client
            .get(format!("{}/number", stub.url()))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, value);
    }

    stub.shutdown().await;
}

#[tokio::test]
async fn test_registration_outside_contract_is_rejected() {
    let stub = start(MATH).await;
    let client = Client::new();

    let mock = r#"{"http-request": {"method": "GET", "path": "/letters"}, "http-response": {"status": 200, "body": "abc"}}"#;
    let response = register(&client, &stub, mock).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response.headers().get(MIMIC_RESULT_HEADER).unwrap(),
        "failure"
    );
    assert!(response.text().await.unwrap().contains("didn't match test.contract"));

    let response = register(&client, &stub, "{}").await;
    assert_eq!(response.status(), 400);

    stub.shutdown().await;
}

#[tokio::test]
async fn test_unknown_path_gets_marked_bad_request() {
    let stub = start(MATH).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/wrong_path", stub.url()))
        .body("10")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(
        response.headers().get(MIMIC_RESULT_HEADER).unwrap(),
        "failure"
    );
    assert_eq!(response.text().await.unwrap(), "URL path not recognised");

    stub.shutdown().await;
}

#[tokio::test]
async fn test_path_parameter_is_echoed_in_json_response() {
    let stub = start(ORDERS).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/orders/42", stub.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let order: serde_json::Value = response.json().await.unwrap();
    assert_eq!(order["id"], 42);
    assert!(order["status"].is_string());

    stub.shutdown().await;
}

#[tokio::test]
async fn test_stub_loaded_from_disk_serves_sibling_mocks() {
    let dir = tempfile::tempdir().unwrap();
    let contract = dir.path().join("math.contract");
    std::fs::write(&contract, MATH).unwrap();
    let data = dir.path().join("math_data");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(
        data.join("square.json"),
        r#"{"http-request": {"method": "POST", "path": "/number", "body": 10}, "http-response": {"status": 200, "body": 100}}"#,
    )
    .unwrap();

    let config = StubConfig {
        contracts: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let stub = serve(Arc::new(load_stub(&config).unwrap()), "127.0.0.1", 0)
        .await
        .unwrap();
    let client = Client::new();

    let body = client
        .post(format!("{}/number", stub.url()))
        .body("10")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "100");

    stub.shutdown().await;
}
