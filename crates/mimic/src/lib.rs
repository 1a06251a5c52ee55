//! Mimic: contract-driven API virtualisation.
//!
//! Contracts are Gherkin features whose clauses describe requests and
//! responses with typed patterns. From them Mimic can validate live
//! traffic, serve a stub that answers like the real service, check that a
//! new contract version stays compatible with the old one, and synthesise
//! contract text from recorded exchanges.
//!
//! ## Module Structure
//!
//! - `value`: concrete request, response and message payloads
//! - `pattern`: the pattern algebra (match, generate, parse, encompass)
//! - `resolver`: named-type lookup and matching policy
//! - `result`: match outcomes with breadcrumbs
//! - `gherkin`, `feature`, `scenario`: contract compilation
//! - `stub`: the expectation registry, tiered resolution and HTTP server
//! - `synthesis`: contract text from exchanges
//! - `compatibility`: backward-compatibility check between contract versions
//! - `config`, `loader`: configuration and on-disk contracts and mocks

pub mod compatibility;
pub mod config;
pub mod error;
pub mod feature;
pub mod gherkin;
pub mod loader;
pub mod pattern;
pub mod resolver;
pub mod result;
pub mod scenario;
pub mod stub;
pub mod synthesis;
pub mod value;

pub use error::{ContractError, NoMatchingScenario};
pub use feature::Feature;
pub use pattern::Pattern;
pub use resolver::{Resolver, Types};
pub use result::{Failure, FailureReason, MatchResult};
pub use scenario::{HttpRequest, HttpResponse, Scenario};
pub use value::Value;
