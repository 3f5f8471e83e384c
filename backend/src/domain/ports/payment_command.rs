//! Driving port for the card payment flow.
//!
//! A card deposit happens in two calls. [`PaymentCommand::quote`] prices the
//! selection and opens a gateway intent; the client completes payment with
//! the returned secret; [`PaymentCommand::confirm`] reads the intent back and
//! hands it to the deposit orchestrator.

use async_trait::async_trait;

use crate::domain::{
    DepositPercentage, Error, GatewayIntentId, PickupRequest, UserId, VehicleSelection,
};

use super::DepositPlacement;

/// Request to price a selection and open an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Paying customer.
    pub customer_id: UserId,
    /// Vehicles and quantities.
    pub selections: Vec<VehicleSelection>,
    /// Share of the total paid up front.
    pub percentage: DepositPercentage,
}

/// Priced intent returned to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentQuote {
    /// Secret for client-side completion.
    pub client_secret: String,
    /// Gateway intent id.
    pub intent_id: GatewayIntentId,
    /// Deposit in catalogue units.
    pub deposit_amount: i64,
    /// Total in catalogue units.
    pub total_amount: i64,
    /// Percentage applied.
    pub percentage: DepositPercentage,
    /// Amount submitted to the gateway, in smallest settlement units.
    pub gateway_amount: i64,
    /// Settlement currency.
    pub currency: String,
    /// Whether the gateway amount was capped below the quoted deposit.
    pub capped: bool,
}

/// Request to turn a completed intent into a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    /// Caller confirming the payment.
    pub caller: UserId,
    /// Intent to confirm.
    pub intent_id: GatewayIntentId,
    /// Proposed pickup slot.
    pub pickup: Option<PickupRequest>,
}

/// Driving port for the card payment flow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    /// Price the selection and open a gateway intent.
    async fn quote(&self, request: QuoteRequest) -> Result<PaymentQuote, Error>;

    /// Confirm a succeeded intent; repeats replay the first outcome.
    async fn confirm(&self, request: ConfirmRequest) -> Result<DepositPlacement, Error>;
}

/// Fixture command used when card payments are not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentCommand;

#[async_trait]
impl PaymentCommand for FixturePaymentCommand {
    async fn quote(&self, _request: QuoteRequest) -> Result<PaymentQuote, Error> {
        Err(Error::service_unavailable("card payments are not configured"))
    }

    async fn confirm(&self, _request: ConfirmRequest) -> Result<DepositPlacement, Error> {
        Err(Error::service_unavailable("card payments are not configured"))
    }
}
