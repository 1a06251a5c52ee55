//! URL patterns: `/orders/(id:number)/items?limit=(number)`.

use super::http::HttpRequest;
use crate::error::ContractError;
use crate::pattern::{parse_pattern, token_pattern, Pattern, Row};
use crate::resolver::Resolver;
use crate::result::{FailureReason, MatchResult};
use crate::value::is_pattern_token;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Literal(String),
    /// `(type)` or `(name:type)`.
    Param {
        name: Option<String>,
        pattern: Pattern,
    },
}

/// Path segments plus query parameters.
///
/// An undeclared query parameter is a mismatch. Declared ones are optional
/// unless `query_required` is set, as it is for URLs recorded from a
/// concrete request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UrlPattern {
    pub segments: Vec<PathSegment>,
    pub query: IndexMap<String, Pattern>,
    pub query_required: bool,
}

fn path_parts(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

fn decode_segment(part: &str) -> String {
    urlencoding::decode(part)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| part.to_string())
}

impl UrlPattern {
    pub fn parse(url: &str) -> Result<Self, ContractError> {
        let (path, query) = url.trim().split_once('?').unwrap_or((url.trim(), ""));

        let segments = path_parts(path)
            .into_iter()
            .map(|part| {
                if is_pattern_token(part) {
                    let token = &part[1..part.len() - 1];
                    let name = token
                        .split_once(':')
                        .filter(|(name, _)| !name.contains(' '))
                        .map(|(name, _)| name.trim().to_string());
                    Ok(PathSegment::Param {
                        name,
                        pattern: token_pattern(token)?,
                    })
                } else {
                    Ok(PathSegment::Literal(part.to_string()))
                }
            })
            .collect::<Result<Vec<_>, ContractError>>()?;

        let mut params = IndexMap::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, text) = pair.split_once('=').unwrap_or((pair, "(string)"));
            params.insert(name.to_string(), parse_pattern(text)?);
        }

        Ok(Self {
            segments,
            query: params,
            query_required: false,
        })
    }

    pub fn matches(&self, request: &HttpRequest, resolver: &Resolver) -> MatchResult {
        self.matches_request_path(request, resolver)
            .and_then(|| self.matches_request_query(request, resolver))
    }

    pub fn matches_request_path(&self, request: &HttpRequest, resolver: &Resolver) -> MatchResult {
        self.matches_path(&request.path, resolver)
            .with_reason(FailureReason::UrlPathMismatch)
    }

    pub fn matches_request_query(&self, request: &HttpRequest, resolver: &Resolver) -> MatchResult {
        self.matches_query(&request.query, resolver)
            .with_reason(FailureReason::QueryMismatch)
    }

    fn matches_path(&self, path: &str, resolver: &Resolver) -> MatchResult {
        let parts = path_parts(path);
        if parts.len() != self.segments.len() {
            return MatchResult::failure(format!("expected path {}, got {path}", self.path()));
        }
        for (index, (segment, part)) in self.segments.iter().zip(parts).enumerate() {
            let decoded = decode_segment(part);
            let result = match segment {
                PathSegment::Literal(literal) if *literal == decoded => MatchResult::Success,
                PathSegment::Literal(literal) => MatchResult::failure(format!(
                    "expected path segment \"{literal}\", got \"{decoded}\""
                )),
                PathSegment::Param { pattern, .. } => resolver.matches_text(pattern, &decoded),
            };
            if result.is_failure() {
                let crumb = match segment {
                    PathSegment::Param { name: Some(name), .. } => name.clone(),
                    _ => format!("path[{index}]"),
                };
                return result.breadcrumb(crumb);
            }
        }
        MatchResult::Success
    }

    fn matches_query(&self, query: &IndexMap<String, String>, resolver: &Resolver) -> MatchResult {
        for (name, value) in query {
            let result = match self.query.get(name) {
                Some(pattern) => resolver.matches_text(pattern, value),
                None => MatchResult::failure(format!("Query param named \"{name}\" was unexpected")),
            };
            if result.is_failure() {
                return result.breadcrumb(format!("?{name}"));
            }
        }
        if self.query_required {
            if let Some(missing) = self.query.keys().find(|name| !query.contains_key(*name)) {
                return MatchResult::failure(format!("Expected query param named \"{missing}\" was missing"))
                    .breadcrumb(format!("?{missing}"));
            }
        }
        MatchResult::Success
    }

    /// Values of named path parameters and query parameters in a request.
    pub fn bindings(&self, request: &HttpRequest) -> Row {
        let mut row = Row::new();
        for (segment, part) in self.segments.iter().zip(path_parts(&request.path)) {
            if let PathSegment::Param { name: Some(name), .. } = segment {
                row.insert(name.clone(), decode_segment(part));
            }
        }
        for (name, value) in &request.query {
            if self.query.contains_key(name) {
                row.insert(name.clone(), value.clone());
            }
        }
        row
    }

    /// A concrete path and query satisfying this pattern.
    pub fn generate(&self, resolver: &Resolver) -> Result<(String, IndexMap<String, String>), ContractError> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                PathSegment::Literal(literal) => path.push_str(literal),
                PathSegment::Param { pattern, .. } => {
                    path.push_str(&pattern.generate(resolver)?.to_literal())
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        let mut query = IndexMap::new();
        for (name, pattern) in &self.query {
            query.insert(name.clone(), pattern.generate(resolver)?.to_literal());
        }
        Ok((path, query))
    }

    /// Substitute row values into named parameters.
    pub fn new_based_on(&self, row: &Row, resolver: &Resolver) -> Result<Self, ContractError> {
        let mut segments = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            segments.push(match segment {
                PathSegment::Param {
                    name: Some(name),
                    pattern,
                } if row.contains(name) => PathSegment::Param {
                    name: Some(name.clone()),
                    pattern: Pattern::Exact(pattern.parse(row.get(name).unwrap_or_default(), resolver)?),
                },
                other => other.clone(),
            });
        }
        let mut query = IndexMap::with_capacity(self.query.len());
        for (name, pattern) in &self.query {
            let pattern = match row.get(name) {
                Some(literal) => Pattern::Exact(pattern.parse(literal, resolver)?),
                None => pattern.clone(),
            };
            query.insert(name.clone(), pattern);
        }
        Ok(Self {
            segments,
            query,
            query_required: self.query_required,
        })
    }

    /// Does this URL accept every URL `other` accepts?
    pub fn encompasses(&self, other: &UrlPattern, this_resolver: &Resolver, other_resolver: &Resolver) -> MatchResult {
        if self.segments.len() != other.segments.len() {
            return MatchResult::failure(format!(
                "expected path {}, got {}",
                self.path(),
                other.path()
            ))
            .with_reason(FailureReason::UrlPathMismatch);
        }
        for (segment, other_segment) in self.segments.iter().zip(&other.segments) {
            let result = match (segment, other_segment) {
                (PathSegment::Literal(a), PathSegment::Literal(b)) if a == b => MatchResult::Success,
                (PathSegment::Param { pattern, .. }, PathSegment::Literal(text)) => {
                    this_resolver.matches_text(pattern, text)
                }
                (PathSegment::Param { pattern, .. }, PathSegment::Param { pattern: other_pattern, .. }) => {
                    pattern.encompasses(other_pattern, this_resolver, other_resolver)
                }
                _ => MatchResult::failure(format!(
                    "expected path {}, got {}",
                    self.path(),
                    other.path()
                )),
            };
            if result.is_failure() {
                return result.with_reason(FailureReason::UrlPathMismatch);
            }
        }
        if self.query_required {
            if let Some(name) = self
                .query
                .keys()
                .find(|name| !(other.query_required && other.query.contains_key(*name)))
            {
                return MatchResult::failure(format!("Query param named \"{name}\" may be absent"))
                    .breadcrumb(format!("?{name}"))
                    .with_reason(FailureReason::QueryMismatch);
            }
        }
        for (name, other_pattern) in &other.query {
            let result = match self.query.get(name) {
                Some(pattern) => pattern.encompasses(other_pattern, this_resolver, other_resolver),
                None => MatchResult::failure(format!("Query param named \"{name}\" is not accepted")),
            };
            if result.is_failure() {
                return result
                    .breadcrumb(format!("?{name}"))
                    .with_reason(FailureReason::QueryMismatch);
            }
        }
        MatchResult::Success
    }

    pub fn path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Literal(literal) => format!("/{literal}"),
                PathSegment::Param { name: Some(name), pattern } => {
                    format!("/({name}:{})", pattern.token_name().unwrap_or_else(|| pattern.type_name()))
                }
                PathSegment::Param { name: None, pattern } => format!("/{pattern}"),
            })
            .collect()
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        for (index, (name, pattern)) in self.query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{separator}{name}={pattern}")?;
        }
        Ok(())
    }
}
