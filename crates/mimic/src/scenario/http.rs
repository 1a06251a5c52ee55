//! Concrete HTTP exchanges.
//!
//! These are the values the transport hands to the engine and the engine
//! hands back. Bodies are [`Value`]s; a string body read from a document is
//! interpreted by its leading character (JSON, XML or plain text).

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Marker header carried by every response the stub produces on its own
/// behalf (no match, rejected registration).
pub const MIMIC_RESULT_HEADER: &str = "X-Mimic-Result";

fn deserialize_body<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Value::parse_body(&text),
        other => other,
    })
}

fn is_null(value: &Value) -> bool {
    matches!(value, Value::Null)
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(
        default,
        deserialize_with = "deserialize_body",
        skip_serializing_if = "is_null"
    )]
    pub body: Value,
}

impl HttpRequest {
    /// Build a request from a method and a URL that may carry a query string.
    pub fn new(method: impl Into<String>, url: &str) -> Self {
        let (path, query) = split_url(url);
        Self {
            method: method.into().to_uppercase(),
            path,
            query,
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Move a query string embedded in `path` into `query`.
    pub fn normalized(mut self) -> Self {
        if self.path.contains('?') {
            let (path, query) = split_url(&self.path);
            self.path = path;
            for (name, value) in query {
                self.query.entry(name).or_insert(value);
            }
        }
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Path plus query string, as written on the request line.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Split `path?query` and decode the query pairs.
pub fn split_url(url: &str) -> (String, IndexMap<String, String>) {
    let Some((path, query)) = url.split_once('?') else {
        return (url.to_string(), IndexMap::new());
    };
    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(name), decode(value))
        })
        .collect();
    (path.to_string(), pairs)
}

fn decode(text: &str) -> String {
    let text = text.replace('+', " ");
    urlencoding::decode(&text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(text)
}

pub(crate) fn find_header<'a>(headers: &'a IndexMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(
        default,
        deserialize_with = "deserialize_body",
        skip_serializing_if = "is_null"
    )]
    pub body: Value,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            body: Value::Null,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200).with_body(body)
    }

    /// A response produced by the stub itself rather than by a contract.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400)
            .with_header(MIMIC_RESULT_HEADER, "failure")
            .with_body(Value::String(message.into()))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body_text(&self) -> String {
        self.body.to_literal()
    }

    /// Declared content type, or the one implied by the body.
    pub fn content_type(&self) -> String {
        self.header("Content-Type")
            .map(str::to_string)
            .unwrap_or_else(|| self.body.content_type().to_string())
    }

    pub fn is_stub_failure(&self) -> bool {
        self.header(MIMIC_RESULT_HEADER) == Some("failure")
    }
}
