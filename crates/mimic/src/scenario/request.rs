//! Request patterns.

use super::headers::HeadersPattern;
use super::http::HttpRequest;
use super::url::UrlPattern;
use crate::error::ContractError;
use crate::pattern::{Pattern, Row};
use crate::resolver::Resolver;
use crate::result::{FailureReason, MatchResult};
use crate::value::Value;

/// Method, URL, headers and body a scenario accepts.
///
/// An absent part places no constraint on the request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpRequestPattern {
    pub method: Option<String>,
    pub url: Option<UrlPattern>,
    pub headers: HeadersPattern,
    pub body: Option<Pattern>,
}

impl HttpRequestPattern {
    /// Read a concrete request (from a mock) as a pattern.
    ///
    /// Pattern tokens in the path, query, headers or body stay patterns.
    /// Every recorded query parameter is required.
    pub fn from_request(request: &HttpRequest) -> Result<Self, ContractError> {
        let mut url = UrlPattern::parse(&request.path)?;
        for (name, value) in &request.query {
            url.query.insert(name.clone(), Pattern::from_value(&Value::string(value.clone())));
        }
        url.query_required = true;
        Ok(Self {
            method: Some(request.method.to_uppercase()),
            url: Some(url),
            headers: HeadersPattern::from_values(&request.headers),
            body: Some(Pattern::from_value(&request.body)),
        })
    }

    pub fn is_http(&self) -> bool {
        self.method.is_some() || self.url.is_some()
    }

    /// The path is checked before the method, so a request for a path no
    /// scenario serves is reported as a path mismatch.
    pub fn matches(&self, request: &HttpRequest, resolver: &Resolver) -> MatchResult {
        let url = self.url.as_ref();
        url.map_or(MatchResult::Success, |url| url.matches_request_path(request, resolver))
            .and_then(|| self.matches_method(request))
            .and_then(|| {
                url.map_or(MatchResult::Success, |url| {
                    url.matches_request_query(request, resolver)
                })
            })
            .and_then(|| {
                self.headers
                    .matches(&request.headers, resolver)
                    .with_reason(FailureReason::HeaderMismatch)
            })
            .and_then(|| match &self.body {
                Some(body) => resolver
                    .matches_body(body, &request.body)
                    .breadcrumb("body")
                    .with_reason(FailureReason::BodyMismatch),
                None => MatchResult::Success,
            })
    }

    fn matches_method(&self, request: &HttpRequest) -> MatchResult {
        match &self.method {
            Some(method) if !method.eq_ignore_ascii_case(&request.method) => MatchResult::failure(
                format!("expected method {method}, got {}", request.method),
            )
            .with_reason(FailureReason::MethodMismatch),
            _ => MatchResult::Success,
        }
    }

    /// A request this pattern accepts.
    pub fn generate(&self, resolver: &Resolver) -> Result<HttpRequest, ContractError> {
        let (path, query) = match &self.url {
            Some(url) => url.generate(resolver)?,
            None => ("/".to_string(), Default::default()),
        };
        let body = match &self.body {
            Some(body) => body.generate(resolver)?,
            None => Default::default(),
        };
        let mut headers = self.headers.generate(resolver)?;
        if !body.is_empty() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Content-Type")) {
            headers.insert("Content-Type".to_string(), body.content_type().to_string());
        }
        Ok(HttpRequest {
            method: self.method.clone().unwrap_or_else(|| "GET".to_string()),
            path,
            query,
            headers,
            body,
        })
    }

    /// This pattern with row values substituted.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<Self, ContractError> {
        let url = match &self.url {
            Some(url) => Some(url.new_based_on(row, resolver)?),
            None => None,
        };
        let body = match &self.body {
            Some(body) => Some(body.concretize(row, resolver)?),
            None => None,
        };
        Ok(Self {
            method: self.method.clone(),
            url,
            headers: self.headers.new_based_on(row, resolver)?,
            body,
        })
    }

    /// Does this pattern accept every request `other` accepts?
    pub fn encompasses(&self, other: &Self, this_resolver: &Resolver, other_resolver: &Resolver) -> MatchResult {
        if let Some(method) = &self.method {
            if !other
                .method
                .as_ref()
                .is_some_and(|other_method| other_method.eq_ignore_ascii_case(method))
            {
                return MatchResult::failure(format!(
                    "expected method {method}, got {}",
                    other.method.as_deref().unwrap_or("any")
                ))
                .with_reason(FailureReason::MethodMismatch);
            }
        }
        let url = match (&self.url, &other.url) {
            (Some(url), Some(other_url)) => url.encompasses(other_url, this_resolver, other_resolver),
            (Some(url), None) => MatchResult::failure(format!("expected path {url}, got any path"))
                .with_reason(FailureReason::UrlPathMismatch),
            (None, _) => MatchResult::Success,
        };
        url.and_then(|| {
            self.headers
                .encompasses(&other.headers, this_resolver, other_resolver)
                .with_reason(FailureReason::HeaderMismatch)
        })
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
