//! Showroom backend library.
//!
//! Dealership deposits and card payments, laid out hexagonally: [`domain`]
//! owns entities, services and ports; [`inbound`] adapts HTTP onto the
//! driving ports; [`outbound`] implements the driven ports on PostgreSQL,
//! Stripe and an email provider.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
