//! Backward compatibility between two versions of a contract.
//!
//! A newer contract is compatible with an older one when every HTTP
//! scenario of the older contract is served by some scenario of the newer
//! one: the newer request pattern accepts every request the older one did,
//! the status is unchanged, and the older response pattern accepts every
//! response the newer one can produce.

use crate::feature::Feature;
use crate::result::{Failure, MatchResult};
use crate::scenario::Scenario;

/// Outcome for one scenario of the older contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioCompatibility {
    Compatible { scenario: String, served_by: String },
    Incompatible { scenario: String, failures: Vec<(String, Failure)> },
}

impl ScenarioCompatibility {
    pub fn is_compatible(&self) -> bool {
        matches!(self, ScenarioCompatibility::Compatible { .. })
    }

    pub fn scenario(&self) -> &str {
        match self {
            ScenarioCompatibility::Compatible { scenario, .. }
            | ScenarioCompatibility::Incompatible { scenario, .. } => scenario,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompatibilityReport {
    pub results: Vec<ScenarioCompatibility>,
}

impl CompatibilityReport {
    pub fn is_compatible(&self) -> bool {
        self.results.iter().all(ScenarioCompatibility::is_compatible)
    }

    pub fn incompatible(&self) -> impl Iterator<Item = &ScenarioCompatibility> {
        self.results.iter().filter(|result| !result.is_compatible())
    }
}

/// Check that `newer` can replace `older` without breaking its consumers.
pub fn check(older: &Feature, newer: &Feature) -> CompatibilityReport {
    let results = older
        .http_scenarios()
        .map(|old| {
            let mut failures = Vec::new();
            for new in newer.http_scenarios() {
                match serves(old, new).into_failure() {
                    None => {
                        return ScenarioCompatibility::Compatible {
                            scenario: old.name.clone(),
                            served_by: new.name.clone(),
                        }
                    }
                    Some(failure) => failures.push((new.name.clone(), failure)),
                }
            }
            ScenarioCompatibility::Incompatible {
                scenario: old.name.clone(),
                failures,
            }
        })
        .collect();
    CompatibilityReport { results }
}

fn serves(old: &Scenario, new: &Scenario) -> MatchResult {
    let old_resolver = old.resolver();
    let new_resolver = new.resolver();
    new.request
        .encompasses(&old.request, &new_resolver, &old_resolver)
        .breadcrumb("REQUEST")
        .and_then(|| {
            old.response
                .encompasses(&new.response, &old_resolver, &new_resolver)
                .breadcrumb("RESPONSE")
        })
}
