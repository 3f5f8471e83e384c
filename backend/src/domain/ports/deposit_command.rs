//! Driving port for placing and managing deposits.

use async_trait::async_trait;

use crate::domain::{
    Deposit, DepositId, DepositPercentage, DepositStatus, Error, GatewayIntentId, PaymentMethod,
    PickupRequest, UserId, VehicleSelection,
};

/// Reservation request handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDepositRequest {
    /// Customer placing the deposit.
    pub customer_id: UserId,
    /// Vehicles and quantities.
    pub selections: Vec<VehicleSelection>,
    /// Share of the total paid up front.
    pub percentage: DepositPercentage,
    /// Payment method.
    pub method: PaymentMethod,
    /// Gateway intent; enables idempotent replay.
    pub gateway_reference: Option<GatewayIntentId>,
    /// Proposed pickup slot.
    pub pickup: Option<PickupRequest>,
    /// What the gateway collected; only card confirmations carry one.
    pub settlement: Option<CardSettlement>,
}

/// Amounts a confirmed card intent committed to.
///
/// Placement refuses the deposit when the catalogue total no longer matches
/// `quoted_total`, and records `collected` as the payment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSettlement {
    /// Order total stored on the intent at quote time.
    pub quoted_total: i64,
    /// Amount the gateway charged, in catalogue units.
    pub collected: i64,
}

/// Outcome of placing a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositPlacement {
    /// A new deposit was written.
    Created(Deposit),
    /// The gateway reference was already processed. The deposit is absent
    /// when it has since been cancelled.
    Replayed(Option<Deposit>),
}

impl DepositPlacement {
    /// Deposit carried by the outcome.
    pub fn deposit(&self) -> Option<&Deposit> {
        match self {
            Self::Created(deposit) => Some(deposit),
            Self::Replayed(deposit) => deposit.as_ref(),
        }
    }

    /// Whether this was an idempotent replay.
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

/// Driving port for deposit writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepositCommand: Send + Sync {
    /// Reserve vehicles and record the deposit, then notify.
    async fn place(&self, request: PlaceDepositRequest) -> Result<DepositPlacement, Error>;

    /// Change a deposit's status on behalf of `caller` (staff or admin).
    async fn update_status(
        &self,
        caller: UserId,
        id: DepositId,
        next: DepositStatus,
    ) -> Result<Deposit, Error>;

    /// Cancel and remove a deposit on behalf of `caller`.
    ///
    /// Staff and admins may cancel any deposit; customers only their own
    /// open deposits.
    async fn cancel(&self, caller: UserId, id: DepositId) -> Result<Deposit, Error>;
}

/// Fixture command that refuses every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDepositCommand;

#[async_trait]
impl DepositCommand for FixtureDepositCommand {
    async fn place(&self, _request: PlaceDepositRequest) -> Result<DepositPlacement, Error> {
        Err(Error::service_unavailable("deposits are not configured"))
    }

    async fn update_status(
        &self,
        _caller: UserId,
        id: DepositId,
        _next: DepositStatus,
    ) -> Result<Deposit, Error> {
        Err(Error::not_found(format!("deposit {id} not found")))
    }

    async fn cancel(&self, _caller: UserId, id: DepositId) -> Result<Deposit, Error> {
        Err(Error::not_found(format!("deposit {id} not found")))
    }
}
