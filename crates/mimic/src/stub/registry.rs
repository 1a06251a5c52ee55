//! Expectation registry.
//!
//! Static expectations come from mock files and are fixed before the stub
//! serves traffic. Dynamic expectations are appended at runtime and
//! scanned most-recent first, so a later registration of an equivalent
//! request overrides the earlier one without removing it.

use crate::resolver::Resolver;
use crate::scenario::{HttpRequest, HttpRequestPattern, HttpResponse, HttpResponsePattern};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// A mock exchange accepted by a contract, ready to answer live requests.
#[derive(Debug, Clone)]
pub struct Expectation {
    pub request: HttpRequestPattern,
    pub response: HttpResponsePattern,
    /// Index of the owning feature in the stub's feature list.
    pub feature: usize,
    /// Index of the accepting scenario inside that feature.
    pub scenario: usize,
    /// Registration sequence number, shared by static and dynamic entries.
    pub order: u64,
    /// Mock file path, or `dynamic` for registrations over the API.
    pub source: String,
}

impl Expectation {
    pub fn matches(&self, request: &HttpRequest, resolver: &Resolver) -> bool {
        self.request.matches(request, resolver).is_success()
    }
}

#[derive(Debug, Default)]
pub struct ExpectationRegistry {
    statics: Vec<Expectation>,
    dynamic: RwLock<Vec<Expectation>>,
    next_order: AtomicU64,
}

impl ExpectationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_order(&self) -> u64 {
        self.next_order.fetch_add(1, Ordering::Relaxed)
    }

    /// Add a static expectation. Only possible while the registry is
    /// exclusively owned, i.e. before serving starts.
    pub fn add_static(&mut self, mut expectation: Expectation) {
        expectation.order = self.next_order();
        self.statics.push(expectation);
    }

    pub fn register(&self, mut expectation: Expectation) -> u64 {
        let mut dynamic = self.dynamic.write();
        expectation.order = self.next_order();
        let order = expectation.order;
        dynamic.push(expectation);
        order
    }

    /// Most recent dynamic expectation accepting the request.
    pub fn find_dynamic<F>(&self, accepts: F) -> Option<Expectation>
    where
        F: Fn(&Expectation) -> bool,
    {
        let dynamic = self.dynamic.read();
        dynamic.iter().rev().find(|e| accepts(e)).cloned()
    }

    pub fn find_static<F>(&self, accepts: F) -> Option<&Expectation>
    where
        F: Fn(&Expectation) -> bool,
    {
        self.statics.iter().find(|e| accepts(e))
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic.read().len()
    }
}

/// Build an expectation for a mock exchange owned by `feature`/`scenario`.
pub fn expectation_for(
    request: &HttpRequest,
    response: &HttpResponse,
    feature: usize,
    scenario: usize,
    source: impl Into<String>,
) -> Result<Expectation, crate::error::ContractError> {
    Ok(Expectation {
        request: HttpRequestPattern::from_request(request)?,
        response: HttpResponsePattern::from_response(response),
        feature,
        scenario,
        order: 0,
        source: source.into(),
    })
}
