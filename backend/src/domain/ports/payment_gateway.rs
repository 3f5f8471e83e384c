//! Outbound port for the card payment gateway.
//!
//! Amounts crossing this port are always in the smallest unit of the
//! settlement currency (for example cents).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::GatewayIntentId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// Gateway unreachable or timed out.
        Unavailable { message: String } => "payment gateway unavailable: {message}",
        /// Gateway refused the request.
        Rejected { status: u16, message: String } => "payment gateway rejected request ({status}): {message}",
        /// The intent does not exist.
        NotFound { intent_id: String } => "payment intent {intent_id} not found",
        /// Response body could not be decoded.
        Decode { message: String } => "payment gateway response malformed: {message}",
    }
}

/// Charge intent to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// Amount in smallest settlement units.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Free-form metadata echoed back on retrieval.
    pub metadata: BTreeMap<String, String>,
}

/// Intent opened by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    /// Gateway identifier.
    pub id: GatewayIntentId,
    /// Secret the client uses to complete payment.
    pub client_secret: String,
}

/// Lifecycle state reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentStatus {
    /// Funds captured.
    Succeeded,
    /// Intent abandoned.
    Canceled,
    /// Any other in-flight state, kept verbatim.
    Pending(String),
}

impl IntentStatus {
    /// Map the gateway's status string.
    pub fn from_gateway(raw: &str) -> Self {
        match raw {
            "succeeded" => Self::Succeeded,
            "canceled" => Self::Canceled,
            other => Self::Pending(other.to_owned()),
        }
    }

    /// Gateway spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Pending(raw) => raw.as_str(),
        }
    }
}

/// Intent as read back from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedIntent {
    /// Gateway identifier.
    pub id: GatewayIntentId,
    /// Lifecycle state.
    pub status: IntentStatus,
    /// Amount in smallest settlement units.
    pub amount: i64,
    /// Metadata recorded at creation.
    pub metadata: BTreeMap<String, String>,
}

/// Driven port for the hosted card gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a charge intent.
    async fn create_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<CreatedIntent, PaymentGatewayError>;

    /// Read an intent back by id.
    async fn retrieve_intent(
        &self,
        id: &GatewayIntentId,
    ) -> Result<RetrievedIntent, PaymentGatewayError>;
}

/// Gateway used when no API key is configured; every call is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPaymentGateway;

#[async_trait]
impl PaymentGateway for DisabledPaymentGateway {
    async fn create_intent(
        &self,
        _request: &IntentRequest,
    ) -> Result<CreatedIntent, PaymentGatewayError> {
        Err(PaymentGatewayError::unavailable(
            "card payments are not configured",
        ))
    }

    async fn retrieve_intent(
        &self,
        _id: &GatewayIntentId,
    ) -> Result<RetrievedIntent, PaymentGatewayError> {
        Err(PaymentGatewayError::unavailable(
            "card payments are not configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("succeeded", IntentStatus::Succeeded)]
    #[case("canceled", IntentStatus::Canceled)]
    #[case("requires_action", IntentStatus::Pending("requires_action".to_owned()))]
    fn maps_gateway_statuses(#[case] raw: &str, #[case] expected: IntentStatus) {
        let status = IntentStatus::from_gateway(raw);
        assert_eq!(status.as_str(), raw);
        assert_eq!(status, expected);
    }

    #[tokio::test]
    async fn disabled_gateway_reports_unavailable() {
        let id = GatewayIntentId::new("pi_1").expect("valid id");
        let err = DisabledPaymentGateway
            .retrieve_intent(&id)
            .await
            .expect_err("disabled gateway");
        assert!(matches!(err, PaymentGatewayError::Unavailable { .. }));
    }
}
