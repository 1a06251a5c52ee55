//! Matching policy configuration.

use crate::stub::UnmatchedMockPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Reject object keys the contract does not declare.
    #[serde(default)]
    pub strict_keys: bool,
    /// `warn` drops a mock no contract accepts; `reject` fails the load.
    #[serde(default)]
    pub unmatched_mocks: UnmatchedMockPolicy,
}
