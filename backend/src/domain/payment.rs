//! Payments recorded against deposits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::DepositId;

/// How the deposit was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// Paid at the showroom.
    Cash,
    /// Paid online through the card gateway.
    Card,
}

/// Unknown payment method string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl PaymentMethod {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash" | "tiền mặt" => Ok(Self::Cash),
            "card" | "stripe" => Ok(Self::Card),
            _ => Err(UnknownPaymentMethod(raw.to_owned())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway payment-intent identifier, used as the idempotency key for
/// confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GatewayIntentId(String);

/// The intent identifier was blank or contained whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("gateway intent id must be a non-empty token without whitespace")]
pub struct InvalidGatewayIntentId;

impl GatewayIntentId {
    /// Validate and wrap an intent identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidGatewayIntentId> {
        let raw = raw.into();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(InvalidGatewayIntentId);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GatewayIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    /// Paid deposit; `None` once the deposit has been cancelled.
    pub deposit_id: Option<DepositId>,
    /// Payment method.
    pub method: PaymentMethod,
    /// Human-readable status line.
    pub status: String,
    /// Gateway intent, unique across payments.
    pub gateway_reference: Option<GatewayIntentId>,
    /// Amount paid in catalogue currency units.
    pub amount: i64,
    /// When the payment was recorded.
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    /// Status line for a card charge that covered less than the deposit.
    pub const PARTIALLY_PAID: &'static str = "partially_paid";

    /// Status line recorded for a new payment.
    pub fn status_line(method: PaymentMethod) -> &'static str {
        match method {
            PaymentMethod::Cash => "awaiting_cash",
            PaymentMethod::Card => "paid",
        }
    }
}
