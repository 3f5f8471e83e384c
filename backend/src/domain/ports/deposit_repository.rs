//! Port for the deposit aggregate and its atomic write sets.
//!
//! Every mutating method runs as one database transaction. Adapters must
//! leave no partial state behind on error: no deposit, no status flip, no
//! payment row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Deposit, DepositDetail, DepositId, DepositStatus, GatewayIntentId, Payment, PaymentMethod,
    UserId, VehicleId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by deposit repository adapters.
    pub enum DepositRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "deposit repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "deposit repository query failed: {message}",
        /// A selected vehicle does not exist.
        VehicleNotFound { vehicle_id: VehicleId } => "vehicle {vehicle_id} not found",
        /// A selected vehicle is already reserved or sold.
        VehicleUnavailable { vehicle_id: VehicleId, name: String } =>
            "vehicle {vehicle_id} ({name}) is not available for reservation",
        /// Another payment already holds this gateway reference.
        DuplicateReference { reference: String } =>
            "payment reference {reference} has already been recorded",
        /// The deposit does not exist.
        NotFound { deposit_id: DepositId } => "deposit {deposit_id} not found",
        /// The status change is not permitted from the current status.
        IllegalTransition { from: DepositStatus, to: DepositStatus } =>
            "deposit cannot move from {from} to {to}",
    }
}

/// Line item to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    /// Reserved vehicle.
    pub vehicle_id: VehicleId,
    /// Units reserved.
    pub quantity: i32,
    /// Price per unit at quote time.
    pub unit_price: i64,
}

/// Pickup row to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPickup {
    /// Vehicle to hand over.
    pub vehicle_id: VehicleId,
    /// Appointment, or `None` for unscheduled.
    pub pickup_at: Option<DateTime<Utc>>,
    /// Location.
    pub location: Option<String>,
}

/// Payment row to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Method.
    pub method: PaymentMethod,
    /// Status line.
    pub status: String,
    /// Gateway intent; unique when present.
    pub gateway_reference: Option<GatewayIntentId>,
    /// Amount in catalogue units.
    pub amount: i64,
}

/// Complete write set for one reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeposit {
    /// Customer placing the deposit.
    pub customer_id: UserId,
    /// Deposit amount in catalogue units.
    pub amount: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Reserved vehicles; the first is recorded as the deposit's vehicle.
    pub line_items: Vec<NewLineItem>,
    /// Pickup rows, one per vehicle.
    pub pickups: Vec<NewPickup>,
    /// Payment row.
    pub payment: NewPayment,
}

impl NewDeposit {
    /// Vehicle recorded on the deposit row.
    pub fn primary_vehicle(&self) -> Option<VehicleId> {
        self.line_items.first().map(|item| item.vehicle_id)
    }
}

/// Deposit listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepositFilter {
    /// Only this status.
    pub status: Option<DepositStatus>,
    /// Only this customer's deposits.
    pub customer_id: Option<UserId>,
}

/// Result of a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the update.
    pub previous: DepositStatus,
    /// Deposit after the update.
    pub deposit: Deposit,
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledDeposit {
    /// The deposit as it was before removal.
    pub deposit: Deposit,
    /// Vehicles returned to `available`.
    pub released_vehicles: Vec<VehicleId>,
}

/// Driven port persisting deposits with their line items, pickups and payment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepositRepository: Send + Sync {
    /// Atomically reserve the vehicles and record the deposit.
    ///
    /// Within one transaction: lock each vehicle row, fail with
    /// [`DepositRepositoryError::VehicleUnavailable`] unless it is
    /// reservable, flip it to `reserved`, insert the deposit, upsert line
    /// items on `(deposit, vehicle)`, insert pickup rows and the payment.
    /// A payment reference already on file yields
    /// [`DepositRepositoryError::DuplicateReference`].
    async fn create(&self, deposit: &NewDeposit) -> Result<Deposit, DepositRepositoryError>;

    /// Payment recorded for a gateway reference, if any.
    async fn find_payment_by_reference(
        &self,
        reference: &GatewayIntentId,
    ) -> Result<Option<Payment>, DepositRepositoryError>;

    /// Deposit with its vehicle, customer, line items and pickups.
    async fn find_detail(&self, id: DepositId)
    -> Result<Option<DepositDetail>, DepositRepositoryError>;

    /// Deposits matching `filter`, newest first.
    async fn list(&self, filter: DepositFilter) -> Result<Vec<Deposit>, DepositRepositoryError>;

    /// Change the status, enforcing [`DepositStatus::can_transition_to`].
    ///
    /// Moving to `cancelled` releases the deposit's vehicles to `available`;
    /// moving to `completed` marks them `sold_out`.
    async fn update_status(
        &self,
        id: DepositId,
        next: DepositStatus,
    ) -> Result<StatusChange, DepositRepositoryError>;

    /// Remove the deposit and compensate.
    ///
    /// Deletes pickup rows, detaches line items and payments (their deposit
    /// reference becomes null) and deletes the deposit. Vehicles go back to
    /// `available` only while the deposit is still open; a cancelled or
    /// completed deposit has already handed them on.
    async fn cancel(&self, id: DepositId) -> Result<CancelledDeposit, DepositRepositoryError>;
}

/// Fixture repository with no deposits; writes report a missing database.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDepositRepository;

#[async_trait]
impl DepositRepository for FixtureDepositRepository {
    async fn create(&self, _deposit: &NewDeposit) -> Result<Deposit, DepositRepositoryError> {
        Err(DepositRepositoryError::connection("no database configured"))
    }

    async fn find_payment_by_reference(
        &self,
        _reference: &GatewayIntentId,
    ) -> Result<Option<Payment>, DepositRepositoryError> {
        Ok(None)
    }

    async fn find_detail(
        &self,
        _id: DepositId,
    ) -> Result<Option<DepositDetail>, DepositRepositoryError> {
        Ok(None)
    }

    async fn list(&self, _filter: DepositFilter) -> Result<Vec<Deposit>, DepositRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_status(
        &self,
        id: DepositId,
        _next: DepositStatus,
    ) -> Result<StatusChange, DepositRepositoryError> {
        Err(DepositRepositoryError::not_found(id))
    }

    async fn cancel(&self, id: DepositId) -> Result<CancelledDeposit, DepositRepositoryError> {
        Err(DepositRepositoryError::not_found(id))
    }
}
