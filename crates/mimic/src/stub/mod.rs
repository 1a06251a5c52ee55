//! Contract-backed stub server.
//!
//! Contracts and the mock exchanges they accept are combined into a
//! [`ContractStub`], which answers live requests and accepts new
//! expectations at runtime.
//!
//! ## Module Structure
//!
//! - `mock`: mock documents and their reserved keys
//! - `registry`: static and dynamic expectations
//! - `engine`: tiered resolution and registration
//! - `handler`: hyper request/response adaptation
//! - `server`: the listener and its lifecycle

mod engine;
mod handler;
mod mock;
mod registry;
mod server;

#[cfg(test)]
mod tests;

pub use engine::{
    fallthrough, Contract, ContractStub, MatchSource, MockSource, RegistrationError,
    UnmatchedMockPolicy, PATH_NOT_RECOGNISED,
};
pub use handler::EXPECTATIONS_PATH;
pub use mock::{Mock, MockError, MOCK_ASYNC_MESSAGE, MOCK_HTTP_REQUEST, MOCK_HTTP_RESPONSE};
pub use registry::{Expectation, ExpectationRegistry};
pub use server::{serve, RunningStub, StubServerError};
