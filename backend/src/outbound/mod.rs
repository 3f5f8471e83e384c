//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel
//! - **stripe**: card payment gateway over HTTP
//! - **email**: transactional email over HTTP, or logged when unconfigured

pub mod email;
pub mod persistence;
pub mod stripe;
