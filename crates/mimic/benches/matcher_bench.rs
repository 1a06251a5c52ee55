use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mimic::stub::{Contract, ContractStub, Mock, UnmatchedMockPolicy};
use mimic::{Feature, HttpRequest, HttpResponse, Value};

/// A contract with `count` GET scenarios on distinct paths.
fn contract_text(count: usize) -> String {
    let mut text = String::from(
        "Feature: Catalogue\n\n  Background:\n    Given type Item\n      | id    | (number) |\n      | name  | (string) |\n      | tags? | (string*) |\n",
    );
    for i in 0..count {
        text.push_str(&format!(
            "\n  Scenario: Item {i}\n    When GET /api/v1/endpoint{i}/(id:number)\n    Then status 200\n    And response-body (Item)\n"
        ));
    }
    text
}

fn build_stub(count: usize, dynamic: usize) -> ContractStub {
    let feature = Feature::from_gherkin(&contract_text(count)).unwrap();
    let stub = ContractStub::new(
        vec![Contract::new("catalogue.contract", feature)],
        vec![],
        UnmatchedMockPolicy::Warn,
    )
    .unwrap();
    for i in 0..dynamic {
        let request = HttpRequest::new("GET", &format!("/api/v1/endpoint{i}/{i}"));
        let body = Value::parse_json(&format!(r#"{{"id": {i}, "name": "item {i}"}}"#)).unwrap();
        stub.register(Mock::http(request, HttpResponse::ok(body))).unwrap();
    }
    stub
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    for scenario_count in [10, 50, 100] {
        let stub = build_stub(scenario_count, 0);
        let first = HttpRequest::new("GET", "/api/v1/endpoint0/7");
        let last = HttpRequest::new("GET", &format!("/api/v1/endpoint{}/7", scenario_count - 1));
        let none = HttpRequest::new("GET", "/nowhere");

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("contract_first", scenario_count),
            &first,
            |b, request| b.iter(|| black_box(stub.resolve(black_box(request)))),
        );
        group.bench_with_input(
            BenchmarkId::new("contract_last", scenario_count),
            &last,
            |b, request| b.iter(|| black_box(stub.resolve(black_box(request)))),
        );
        group.bench_with_input(
            BenchmarkId::new("fallthrough", scenario_count),
            &none,
            |b, request| b.iter(|| black_box(stub.resolve(black_box(request)))),
        );
    }

    group.finish();
}

fn bench_dynamic_expectations(c: &mut Criterion) {
    let mut group = c.benchmark_group("dynamic_expectations");

    for expectation_count in [10, 100] {
        let stub = build_stub(expectation_count, expectation_count);
        let oldest = HttpRequest::new("GET", "/api/v1/endpoint0/0");

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("match_oldest", expectation_count),
            &oldest,
            |b, request| b.iter(|| black_box(stub.resolve(black_box(request)))),
        );
    }

    group.finish();
}

fn bench_body_matching(c: &mut Criterion) {
    let feature = Feature::from_gherkin(&contract_text(1)).unwrap();
    let scenario = &feature.scenarios[0];
    let resolver = scenario.resolver();
    let item = mimic::Pattern::deferred("Item");
    let body = Value::parse_json(r#"{"id": 10, "name": "widget", "tags": ["a", "b", "c"]}"#).unwrap();

    let mut group = c.benchmark_group("pattern");
    group.throughput(Throughput::Elements(1));
    group.bench_function("match_object", |b| {
        b.iter(|| black_box(resolver.matches_pattern(&item, black_box(&body))))
    });
    group.bench_function("generate_object", |b| {
        b.iter(|| black_box(item.generate(&resolver)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resolution,
    bench_dynamic_expectations,
    bench_body_matching
);
criterion_main!(benches);
