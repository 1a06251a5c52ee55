//! Match outcomes with breadcrumb trails.
//!
//! A `MatchResult` is either `Success` or a `Failure` carrying the message and
//! the field path leading to the mismatch. Nested matches prepend their own
//! field name, so the final report reads as a path:
//! `items[2].price: expected number, got string`.

use crate::value::Value;
use std::fmt;

/// Coarse classification of why a request or message was rejected.
///
/// Used to pick the nearest-miss explanation when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    MethodMismatch,
    UrlPathMismatch,
    QueryMismatch,
    HeaderMismatch,
    BodyMismatch,
    StatusMismatch,
    MessageMismatch,
}

/// A localized mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: String,
    /// Outermost label first.
    pub breadcrumbs: Vec<String>,
    pub reason: Option<FailureReason>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            breadcrumbs: Vec::new(),
            reason: None,
        }
    }

    /// Render the breadcrumb trail, e.g. `items[2].price`.
    ///
    /// Index crumbs (`[2]`) attach without a separating dot.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for crumb in &self.breadcrumbs {
            if !path.is_empty() && !crumb.starts_with('[') {
                path.push('.');
            }
            path.push_str(crumb);
        }
        path
    }

    /// Full report: `path: message`, or just the message at the top level.
    pub fn report(&self) -> String {
        let path = self.path();
        if path.is_empty() {
            self.message.clone()
        } else {
            format!("{path}: {}", self.message)
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

/// Outcome of `matches` / `encompasses`.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Success,
    Failure(Failure),
}

impl MatchResult {
    pub fn failure(message: impl Into<String>) -> Self {
        MatchResult::Failure(Failure::new(message))
    }

    /// Standard type mismatch: `expected number, got string`.
    pub fn mismatch(expected: impl fmt::Display, actual: &Value) -> Self {
        Self::failure(format!("expected {expected}, got {}", actual.type_name()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Prepend an outer field label to the failure path.
    pub fn breadcrumb(self, crumb: impl Into<String>) -> Self {
        match self {
            MatchResult::Success => MatchResult::Success,
            MatchResult::Failure(mut failure) => {
                failure.breadcrumbs.insert(0, crumb.into());
                MatchResult::Failure(failure)
            }
        }
    }

    /// Tag the failure with a reason unless an inner match already did.
    pub fn with_reason(self, reason: FailureReason) -> Self {
        match self {
            MatchResult::Success => MatchResult::Success,
            MatchResult::Failure(mut failure) => {
                failure.reason.get_or_insert(reason);
                MatchResult::Failure(failure)
            }
        }
    }

    /// Run `next` only if this result succeeded.
    pub fn and_then(self, next: impl FnOnce() -> MatchResult) -> MatchResult {
        match self {
            MatchResult::Success => next(),
            failure => failure,
        }
    }

    pub fn failure_ref(&self) -> Option<&Failure> {
        match self {
            MatchResult::Success => None,
            MatchResult::Failure(failure) => Some(failure),
        }
    }

    pub fn into_failure(self) -> Option<Failure> {
        match self {
            MatchResult::Success => None,
            MatchResult::Failure(failure) => Some(failure),
        }
    }

    pub fn report(&self) -> String {
        match self {
            MatchResult::Success => "success".to_string(),
            MatchResult::Failure(failure) => failure.report(),
        }
    }
}

/// Fold a sequence of results, stopping at the first failure.
pub fn all_of(results: impl IntoIterator<Item = MatchResult>) -> MatchResult {
    for result in results {
        if result.is_failure() {
            return result;
        }
    }
    MatchResult::Success
}
