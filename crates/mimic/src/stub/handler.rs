//! HTTP adapter between hyper and the stub engine.

use super::engine::{ContractStub, RegistrationError};
use super::mock::Mock;
use crate::scenario::{split_url, HttpRequest, HttpResponse};
use crate::value::Value;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use indexmap::IndexMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dynamic registration endpoint.
pub const EXPECTATIONS_PATH: &str = "/_mimic/expectations";

pub async fn handle_stub_request(
    req: Request<Incoming>,
    stub: Arc<ContractStub>,
    client_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let url = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let headers: IndexMap<String, String> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let body = match req.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).to_string(),
        Err(e) => {
            warn!("Failed to read request body from {}: {}", client_addr, e);
            String::new()
        }
    };

    if method == Method::POST && path == EXPECTATIONS_PATH {
        return Ok(to_hyper(register(&stub, &body)));
    }

    let (path, query) = split_url(&url);
    let request = HttpRequest {
        method: method.as_str().to_string(),
        path,
        query,
        headers,
        body: Value::parse_body(&body),
    };

    let (response, source) = stub.resolve(&request);
    debug!(
        "{} {} from {} answered by {} with {}",
        request.method, request.path, client_addr, source, response.status
    );
    Ok(to_hyper(response))
}

fn register(stub: &ContractStub, body: &str) -> HttpResponse {
    let outcome = Mock::parse(body)
        .map_err(RegistrationError::from)
        .and_then(|mock| stub.register(mock));
    match outcome {
        Ok(()) => HttpResponse::new(200),
        Err(e) => {
            warn!("Rejected expectation: {}", e);
            HttpResponse::bad_request(e.to_string())
        }
    }
}

fn to_hyper(response: HttpResponse) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !response.body.is_empty() && response.header("Content-Type").is_none() {
        builder = builder.header("Content-Type", response.content_type());
    }
    builder
        .body(Full::new(Bytes::from(response.body_text())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}
