//! Response patterns.

use super::headers::HeadersPattern;
use super::http::HttpResponse;
use crate::error::ContractError;
use crate::pattern::{Pattern, Row};
use crate::resolver::Resolver;
use crate::result::{FailureReason, MatchResult};
use crate::value::Value;

/// Status, headers and body a scenario answers with.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponsePattern {
    pub status: u16,
    pub headers: HeadersPattern,
    /// `None` places no constraint on the body and generates an empty one.
    pub body: Option<Pattern>,
}

impl Default for HttpResponsePattern {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeadersPattern::default(),
            body: None,
        }
    }
}

impl HttpResponsePattern {
    /// Read a concrete response (from a mock) as a pattern.
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: HeadersPattern::from_values(&response.headers),
            body: Some(Pattern::from_value(&response.body)),
        }
    }

    pub fn matches(&self, response: &HttpResponse, resolver: &Resolver) -> MatchResult {
        if response.status != self.status {
            return MatchResult::failure(format!(
                "expected status {}, got {}",
                self.status, response.status
            ))
            .with_reason(FailureReason::StatusMismatch);
        }
        self.headers
            .matches(&response.headers, resolver)
            .with_reason(FailureReason::HeaderMismatch)
            .and_then(|| match &self.body {
                Some(body) => resolver
                    .matches_body(body, &response.body)
                    .breadcrumb("body")
                    .with_reason(FailureReason::BodyMismatch),
                None => MatchResult::Success,
            })
    }

    pub fn generate(&self, resolver: &Resolver) -> Result<HttpResponse, ContractError> {
        let body = match &self.body {
            Some(body) => body.generate(resolver)?,
            None => Value::Null,
        };
        Ok(HttpResponse {
            status: self.status,
            headers: self.headers.generate(resolver)?,
            body,
        })
    }

    /// This pattern with row values substituted.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<Self, ContractError> {
        let body = match &self.body {
            Some(body) => Some(body.concretize(row, resolver)?),
            None => None,
        };
        Ok(Self {
            status: self.status,
            headers: self.headers.new_based_on(row, resolver)?,
            body,
        })
    }

    /// Does this pattern accept every response `other` can produce?
    pub fn encompasses(&self, other: &Self, this_resolver: &Resolver, other_resolver: &Resolver) -> MatchResult {
        if self.status != other.status {
            return MatchResult::failure(format!(
                "expected status {}, got {}",
                self.status, other.status
            ))
            .with_reason(FailureReason::StatusMismatch);
        }
        self.headers
            .encompasses(&other.headers, this_resolver, other_resolver)
            .with_reason(FailureReason::HeaderMismatch)
            .and_then(|| match (&self.body, &other.body) {
                (Some(body), Some(other_body)) => body
                    .encompasses(other_body, this_resolver, other_resolver)
                    .breadcrumb("body")
                    .with_reason(FailureReason::BodyMismatch),
                (Some(body), None) => MatchResult::failure(format!("expected body {body}, got any body"))
                    .with_reason(FailureReason::BodyMismatch),
                (None, _) => MatchResult::Success,
            })
    }
}
