//! Stripe payment gateway adapter.

mod dto;
mod http_gateway;

pub use http_gateway::StripeHttpGateway;
