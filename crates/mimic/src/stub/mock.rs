//! Mock documents: a recorded exchange a contract is expected to allow.
//!
//! On disk and over the registration endpoint a mock is a JSON object with
//! reserved top-level keys:
//!
//! ```json
//! {"http-request": {"method": "GET", "path": "/number"},
//!  "http-response": {"status": 200, "body": 10}}
//! ```
//!
//! or, for message-channel scenarios, an `async-message` object carrying
//! `channel`, an optional `key` and `value`.

use crate::scenario::{AsyncMessage, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MOCK_HTTP_REQUEST: &str = "http-request";
pub const MOCK_HTTP_RESPONSE: &str = "http-response";
pub const MOCK_ASYNC_MESSAGE: &str = "async-message";

#[derive(Debug, Error)]
pub enum MockError {
    #[error("invalid mock document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mock document has {0} but no {1}")]
    Incomplete(&'static str, &'static str),
    #[error("mock document needs http-request and http-response, or async-message")]
    Empty,
}

/// Wire shape of a mock document; every key is optional so that the
/// combination can be checked with a useful message.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawMock {
    #[serde(rename = "http-request", default, skip_serializing_if = "Option::is_none")]
    request: Option<HttpRequest>,
    #[serde(rename = "http-response", default, skip_serializing_if = "Option::is_none")]
    response: Option<HttpResponse>,
    #[serde(rename = "async-message", default, skip_serializing_if = "Option::is_none")]
    message: Option<AsyncMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mock {
    Http {
        request: HttpRequest,
        response: HttpResponse,
    },
    Message(AsyncMessage),
}

impl Mock {
    pub fn http(request: HttpRequest, response: HttpResponse) -> Self {
        Mock::Http {
            request: request.normalized(),
            response,
        }
    }

    pub fn parse(text: &str) -> Result<Self, MockError> {
        let raw: RawMock = serde_json::from_str(text)?;
        match raw {
            RawMock {
                request: Some(request),
                response: Some(response),
                ..
            } => Ok(Mock::http(request, response)),
            RawMock {
                request: Some(_), ..
            } => Err(MockError::Incomplete(MOCK_HTTP_REQUEST, MOCK_HTTP_RESPONSE)),
            RawMock {
                response: Some(_), ..
            } => Err(MockError::Incomplete(MOCK_HTTP_RESPONSE, MOCK_HTTP_REQUEST)),
            RawMock {
                message: Some(message),
                ..
            } => Ok(Mock::Message(message)),
            _ => Err(MockError::Empty),
        }
    }

    pub fn to_json(&self) -> Result<String, MockError> {
        let raw = match self {
            Mock::Http { request, response } => RawMock {
                request: Some(request.clone()),
                response: Some(response.clone()),
                message: None,
            },
            Mock::Message(message) => RawMock {
                message: Some(message.clone()),
                ..Default::default()
            },
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }
}
