//! The stub engine: layered resolution of live requests.
//!
//! A request is answered by the first tier that accepts it:
//!
//! 1. dynamic expectations, most recently registered first;
//! 2. static expectations loaded from mock files;
//! 3. the contracts themselves, generating a response from the scenario;
//! 4. a fallthrough `400` carrying the `X-Mimic-Result: failure` marker.

use super::mock::{Mock, MockError};
use super::registry::{expectation_for, Expectation, ExpectationRegistry};
use crate::error::{ContractError, NoMatchingScenario};
use crate::feature::Feature;
use crate::resolver::Resolver;
use crate::result::FailureReason;
use crate::scenario::{AsyncMessage, HttpRequest, HttpResponse};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const PATH_NOT_RECOGNISED: &str = "URL path not recognised";

/// What to do with a mock file that no contract accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedMockPolicy {
    /// Drop the mock, log the report, keep loading.
    #[default]
    Warn,
    /// Abort the load.
    Reject,
}

/// Which tier produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    DynamicExpectation,
    StaticExpectation,
    Contract,
    Fallthrough,
}

impl MatchSource {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchSource::Fallthrough)
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchSource::DynamicExpectation => "dynamic expectation",
            MatchSource::StaticExpectation => "static expectation",
            MatchSource::Contract => "contract",
            MatchSource::Fallthrough => "fallthrough",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Mock(#[from] MockError),
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// One report per contract tried.
    #[error("{}", .0.join("\n"))]
    NoMatchingScenario(Vec<String>),
}

/// A compiled contract and where it came from.
#[derive(Debug, Clone)]
pub struct Contract {
    pub path: String,
    pub feature: Feature,
}

impl Contract {
    pub fn new(path: impl Into<String>, feature: Feature) -> Self {
        Self {
            path: path.into(),
            feature,
        }
    }
}

/// A mock paired with the name it is reported under.
#[derive(Debug, Clone)]
pub struct MockSource {
    pub source: String,
    pub mock: Mock,
}

impl MockSource {
    pub fn new(source: impl Into<String>, mock: Mock) -> Self {
        Self {
            source: source.into(),
            mock,
        }
    }
}

pub struct ContractStub {
    contracts: Vec<Contract>,
    registry: ExpectationRegistry,
    messages: RwLock<IndexMap<String, Vec<AsyncMessage>>>,
    diagnostics: Vec<String>,
}

impl ContractStub {
    /// Build a stub over `contracts`, admitting the mocks they accept.
    ///
    /// A mock no contract accepts is dropped with a warning, or fails the
    /// whole construction under [`UnmatchedMockPolicy::Reject`].
    pub fn new(
        contracts: Vec<Contract>,
        mocks: Vec<MockSource>,
        policy: UnmatchedMockPolicy,
    ) -> Result<Self, RegistrationError> {
        let mut stub = Self {
            contracts,
            registry: ExpectationRegistry::new(),
            messages: RwLock::new(IndexMap::new()),
            diagnostics: Vec::new(),
        };

        for MockSource { source, mock } in mocks {
            match stub.accept(&mock, &source) {
                Ok(Accepted::Http(expectation)) => {
                    debug!(mock = %source, "Loaded static expectation");
                    stub.registry.add_static(expectation);
                }
                Ok(Accepted::Message(message)) => stub.push_message(message),
                Err(RegistrationError::NoMatchingScenario(reports)) => {
                    for report in &reports {
                        warn!("{}", report);
                    }
                    if policy == UnmatchedMockPolicy::Reject {
                        return Err(RegistrationError::NoMatchingScenario(reports));
                    }
                    stub.diagnostics.extend(reports);
                }
                Err(other) => {
                    error!(mock = %source, "Failed to load mock: {}", other);
                    if policy == UnmatchedMockPolicy::Reject {
                        return Err(other);
                    }
                    stub.diagnostics.push(format!("{source}: {other}"));
                }
            }
        }

        info!(
            "Stub ready with {} contract(s) and {} static expectation(s)",
            stub.contracts.len(),
            stub.registry.static_count()
        );
        Ok(stub)
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    /// Reports for mocks dropped while loading.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn registry(&self) -> &ExpectationRegistry {
        &self.registry
    }

    /// Register a mock at runtime. A mock that no contract accepts is
    /// rejected and not stored.
    pub fn register(&self, mock: Mock) -> Result<(), RegistrationError> {
        match self.accept(&mock, "dynamic")? {
            Accepted::Http(expectation) => {
                let path = self.contracts[expectation.feature].path.clone();
                let order = self.registry.register(expectation);
                info!(contract = %path, order, "Registered dynamic expectation");
            }
            Accepted::Message(message) => {
                info!(channel = %message.channel, "Registered message");
                self.push_message(message);
            }
        }
        Ok(())
    }

    /// Messages accepted for `channel`, in registration order.
    pub fn messages(&self, channel: &str) -> Vec<AsyncMessage> {
        self.messages
            .read()
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Answer a live request.
    pub fn resolve(&self, request: &HttpRequest) -> (HttpResponse, MatchSource) {
        if let Some(expectation) = self
            .registry
            .find_dynamic(|expectation| self.expectation_accepts(expectation, request))
        {
            return (
                self.respond_with(&expectation),
                MatchSource::DynamicExpectation,
            );
        }

        if let Some(expectation) = self
            .registry
            .find_static(|expectation| self.expectation_accepts(expectation, request))
        {
            return (self.respond_with(expectation), MatchSource::StaticExpectation);
        }

        let mut misses = NoMatchingScenario::default();
        for contract in &self.contracts {
            match contract.feature.lookup_response(request) {
                Ok(response) => {
                    debug!(contract = %contract.path, "{} {} served from contract", request.method, request.path);
                    return (response, MatchSource::Contract);
                }
                Err(miss) => misses.merge(miss),
            }
        }

        debug!("{} {} matched nothing:\n{}", request.method, request.path, misses);
        (fallthrough(&misses), MatchSource::Fallthrough)
    }

    fn resolver_for(&self, expectation: &Expectation) -> Resolver {
        self.contracts
            .get(expectation.feature)
            .and_then(|contract| contract.feature.scenarios.get(expectation.scenario))
            .map(|scenario| scenario.resolver())
            .unwrap_or_default()
    }

    fn expectation_accepts(&self, expectation: &Expectation, request: &HttpRequest) -> bool {
        expectation.matches(request, &self.resolver_for(expectation))
    }

    fn respond_with(&self, expectation: &Expectation) -> HttpResponse {
        match expectation.response.generate(&self.resolver_for(expectation)) {
            Ok(response) => response,
            Err(err) => {
                error!(mock = %expectation.source, "Could not generate response: {}", err);
                HttpResponse::bad_request(err.to_string())
            }
        }
    }

    fn push_message(&self, message: AsyncMessage) {
        self.messages
            .write()
            .entry(message.channel.clone())
            .or_default()
            .push(message);
    }

    /// Find the first contract accepting a mock.
    fn accept(&self, mock: &Mock, source: &str) -> Result<Accepted, RegistrationError> {
        let mut reports = Vec::with_capacity(self.contracts.len());
        for (index, contract) in self.contracts.iter().enumerate() {
            let outcome = match mock {
                Mock::Http { request, response } => {
                    contract.feature.matching_mock(request, response)
                }
                Mock::Message(message) => contract.feature.matching_message(message),
            };
            match outcome {
                Ok(scenario) => {
                    return match mock {
                        Mock::Http { request, response } => Ok(Accepted::Http(
                            expectation_for(request, response, index, scenario, source)?,
                        )),
                        Mock::Message(message) => Ok(Accepted::Message(message.clone())),
                    };
                }
                Err(miss) => {
                    reports.push(format!("{source} didn't match {}\n{miss}", contract.path));
                }
            }
        }
        if reports.is_empty() {
            reports.push(format!("{source} didn't match any contract: none are loaded"));
        }
        Err(RegistrationError::NoMatchingScenario(reports))
    }
}

enum Accepted {
    Http(Expectation),
    Message(AsyncMessage),
}

/// The deterministic response for a request nothing accepted.
pub fn fallthrough(misses: &NoMatchingScenario) -> HttpResponse {
    let path_only = !misses.is_empty()
        && misses
            .failures
            .iter()
            .all(|(_, failure)| failure.reason == Some(FailureReason::UrlPathMismatch));
    if path_only {
        HttpResponse::bad_request(PATH_NOT_RECOGNISED)
    } else {
        HttpResponse::bad_request(misses.to_string())
    }
}
