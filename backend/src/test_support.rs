//! Test doubles shared by unit tests and the `tests/` suites.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

mod memory_store;
mod recording_email;
mod stub_gateway;

pub use memory_store::InMemoryStore;
pub use recording_email::RecordingEmailSender;
pub use stub_gateway::StubGateway;
