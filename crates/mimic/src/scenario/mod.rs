//! Compiled scenarios.
//!
//! A [`Scenario`] is one request/response (or message) contract unit,
//! compiled against the named types of its feature. Scenarios are immutable;
//! each matching call builds a fresh [`Resolver`] over the shared types.

mod headers;
mod http;
mod message;
mod request;
mod response;
mod url;

pub use headers::HeadersPattern;
pub use http::{split_url, HttpRequest, HttpResponse, MIMIC_RESULT_HEADER};
pub use message::{AsyncMessage, MessagePattern};
pub use request::HttpRequestPattern;
pub use response::HttpResponsePattern;
pub use url::{PathSegment, UrlPattern};

use crate::error::ContractError;
use crate::pattern::{Examples, Row};
use crate::resolver::{Resolver, Types};
use crate::result::MatchResult;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub request: HttpRequestPattern,
    pub response: HttpResponsePattern,
    pub message: Option<MessagePattern>,
    pub types: Arc<Types>,
    pub examples: Vec<Examples>,
    pub strict_keys: bool,
}

impl Scenario {
    pub fn new(name: impl Into<String>, types: Arc<Types>) -> Self {
        Self {
            name: name.into(),
            request: HttpRequestPattern::default(),
            response: HttpResponsePattern::default(),
            message: None,
            types,
            examples: Vec::new(),
            strict_keys: false,
        }
    }

    /// Resolver for live traffic.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::clone(&self.types)).with_strict_keys(self.strict_keys)
    }

    /// Resolver for examples written by people, where `(type)` tokens stand
    /// in for values.
    pub fn mock_resolver(&self) -> Resolver {
        self.resolver().in_mock_mode()
    }

    pub fn is_http(&self) -> bool {
        self.request.is_http()
    }

    pub fn matches_request(&self, request: &HttpRequest) -> MatchResult {
        if !self.is_http() {
            return MatchResult::failure("scenario declares no HTTP request");
        }
        self.request.matches(request, &self.resolver())
    }

    /// Check a mock exchange against this scenario.
    pub fn matches_mock(&self, request: &HttpRequest, response: &HttpResponse) -> MatchResult {
        if !self.is_http() {
            return MatchResult::failure("scenario declares no HTTP request");
        }
        let resolver = self.mock_resolver();
        self.request
            .matches(request, &resolver)
            .breadcrumb("REQUEST")
            .and_then(|| self.response.matches(response, &resolver).breadcrumb("RESPONSE"))
    }

    pub fn matches_message(&self, message: &AsyncMessage) -> MatchResult {
        match &self.message {
            Some(pattern) => pattern.matches(message, &self.mock_resolver()),
            None => MatchResult::failure("scenario declares no message"),
        }
    }

    /// Generate the response to an accepted request.
    ///
    /// Named path and query parameters of the request are substituted into
    /// the response pattern first, so a response field named like a
    /// parameter echoes it.
    pub fn generate_response(&self, request: &HttpRequest) -> Result<HttpResponse, ContractError> {
        let resolver = self.resolver();
        let row = match &self.request.url {
            Some(url) => url.bindings(request),
            None => Row::new(),
        };
        if row.is_empty() {
            return self.response.generate(&resolver);
        }
        self.response.new_based_on(&row, &resolver)?.generate(&resolver)
    }

    /// A request this scenario accepts, for driving a real service.
    pub fn generate_request(&self) -> Result<HttpRequest, ContractError> {
        self.request.generate(&self.resolver())
    }

    /// This scenario with one example row substituted into its request.
    pub fn new_based_on(&self, row: &Row) -> Result<Scenario, ContractError> {
        Ok(Scenario {
            request: self.request.new_based_on(row, &self.resolver())?,
            examples: Vec::new(),
            ..self.clone()
        })
    }

    /// One scenario per example row, or this scenario when it has none.
    pub fn expand(&self) -> Result<Vec<Scenario>, ContractError> {
        let rows: Vec<&Row> = self.examples.iter().flat_map(|examples| &examples.rows).collect();
        if rows.is_empty() {
            return Ok(vec![self.clone()]);
        }
        rows.into_iter().map(|row| self.new_based_on(row)).collect()
    }
}
