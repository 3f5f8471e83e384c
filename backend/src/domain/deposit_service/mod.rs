//! Deposit orchestration.
//!
//! [`DepositService`] implements both deposit driving ports. Placement prices
//! the selection from the catalogue (client totals are never trusted), hands
//! one write set to the repository for atomic execution and fans out only
//! after the commit. Gateway references make placement idempotent: a known
//! reference replays the stored outcome, and a concurrent duplicate that loses
//! the unique-constraint race replays the winner's.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use rand::Rng;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{
    CardSettlement, DepositCommand, DepositFilter, DepositPlacement, DepositQuery, DepositRepository,
    DepositRepositoryError, NewDeposit, NewLineItem, NewPayment, NewPickup, PlaceDepositRequest,
    UserDirectory, UserDirectoryError, VehicleRepository, VehicleRepositoryError,
};
use super::{
    Deposit, DepositDetail, DepositEvent, DepositEventKind, DepositId, DepositPercentage,
    DepositQuote, DepositStatus, Error, GatewayIntentId, NotificationFanout, Payment,
    PickupPolicy, PricingError, User, UserId, VehicleSelection, merge_selections, quote_deposit,
};

/// Scheduling settings for new deposits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositSettings {
    /// What to write when the caller proposes no pickup slot.
    pub pickup_policy: PickupPolicy,
    /// Location used when none is given.
    pub pickup_location: String,
}

impl Default for DepositSettings {
    fn default() -> Self {
        Self {
            pickup_policy: PickupPolicy::default(),
            pickup_location: "Showroom".to_owned(),
        }
    }
}

/// Ports the deposit service drives.
#[derive(Clone)]
pub struct DepositServicePorts {
    /// Deposit, payment and pickup storage.
    pub deposits: Arc<dyn DepositRepository>,
    /// Catalogue used for pricing.
    pub vehicles: Arc<dyn VehicleRepository>,
    /// Caller and customer lookup.
    pub users: Arc<dyn UserDirectory>,
}

/// Deposit orchestrator and read model.
#[derive(Clone)]
pub struct DepositService {
    deposits: Arc<dyn DepositRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    users: Arc<dyn UserDirectory>,
    fanout: NotificationFanout,
    clock: Arc<dyn Clock>,
    settings: DepositSettings,
}

impl DepositService {
    /// Create the service.
    pub fn new(
        ports: DepositServicePorts,
        fanout: NotificationFanout,
        clock: Arc<dyn Clock>,
        settings: DepositSettings,
    ) -> Self {
        Self {
            deposits: ports.deposits,
            vehicles: ports.vehicles,
            users: ports.users,
            fanout,
            clock,
            settings,
        }
    }

    async fn replay(&self, reference: &GatewayIntentId) -> Result<Option<DepositPlacement>, Error> {
        let Some(payment) = self
            .deposits
            .find_payment_by_reference(reference)
            .await
            .map_err(map_deposit_error)?
        else {
            return Ok(None);
        };
        let deposit = match payment.deposit_id {
            Some(id) => self
                .deposits
                .find_detail(id)
                .await
                .map_err(map_deposit_error)?
                .map(|detail| detail.deposit),
            None => None,
        };
        info!(
            reference = %reference,
            deposit_id = ?deposit.as_ref().map(|d| d.id.get()),
            "payment reference already processed; replaying"
        );
        Ok(Some(DepositPlacement::Replayed(deposit)))
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized(format!("unknown user {id}")))
    }

    async fn require_back_office(&self, id: UserId) -> Result<User, Error> {
        let user = self.require_user(id).await?;
        if user.role.is_back_office() {
            Ok(user)
        } else {
            Err(Error::forbidden("staff or admin role required"))
        }
    }

    /// Detail plus its customer; both must exist for any mutation.
    async fn load_for_mutation(&self, id: DepositId) -> Result<(DepositDetail, User), Error> {
        let detail = self
            .deposits
            .find_detail(id)
            .await
            .map_err(map_deposit_error)?
            .ok_or_else(|| Error::not_found(format!("deposit {id} not found")))?;
        let customer = detail
            .customer
            .clone()
            .ok_or_else(|| Error::not_found(format!("deposit {id} has no linked customer")))?;
        Ok((detail, customer))
    }

    fn build_write_set(
        &self,
        request: &PlaceDepositRequest,
        quote: &DepositQuote,
    ) -> NewDeposit {
        let now = self.clock.utc();
        let mut rng = rand::thread_rng();
        self.write_set_with(request, quote, now, &mut rng)
    }

    fn write_set_with<R: Rng>(
        &self,
        request: &PlaceDepositRequest,
        quote: &DepositQuote,
        now: chrono::DateTime<chrono::Utc>,
        rng: &mut R,
    ) -> NewDeposit {
        let line_items = quote
            .items
            .iter()
            .map(|item| NewLineItem {
                vehicle_id: item.vehicle.id,
                quantity: item.quantity,
                unit_price: item.unit_price(),
            })
            .collect();
        let pickups = quote
            .items
            .iter()
            .map(|item| {
                let slot = self.settings.pickup_policy.resolve(
                    request.pickup.as_ref(),
                    &self.settings.pickup_location,
                    now,
                    rng,
                );
                NewPickup {
                    vehicle_id: item.vehicle.id,
                    pickup_at: slot.pickup_at,
                    location: slot.location,
                }
            })
            .collect();

        let collected = request
            .settlement
            .map_or(quote.deposit_amount, |settlement| settlement.collected);
        let status = if collected < quote.deposit_amount {
            Payment::PARTIALLY_PAID
        } else {
            Payment::status_line(request.method)
        };
        NewDeposit {
            customer_id: request.customer_id,
            amount: quote.deposit_amount,
            created_at: now,
            line_items,
            pickups,
            payment: NewPayment {
                method: request.method,
                status: status.to_owned(),
                gateway_reference: request.gateway_reference.clone(),
                amount: collected,
            },
        }
    }

    async fn publish(
        &self,
        kind: DepositEventKind,
        deposit: &Deposit,
        customer: User,
        vehicle_name: String,
    ) {
        let event = DepositEvent {
            kind,
            deposit_id: deposit.id,
            customer,
            vehicle_name,
            amount: deposit.amount,
            status: deposit.status,
        };
        self.fanout.publish(&event).await;
    }
}

#[async_trait]
impl DepositCommand for DepositService {
    async fn place(&self, request: PlaceDepositRequest) -> Result<DepositPlacement, Error> {
        if let Some(reference) = &request.gateway_reference {
            if let Some(placement) = self.replay(reference).await? {
                return Ok(placement);
            }
        }

        let quote = price_selection(
            self.vehicles.as_ref(),
            &request.selections,
            request.percentage,
        )
        .await?;
        if let Some(settlement) = request.settlement {
            check_settlement(&quote, settlement)?;
        }
        let customer = self.require_user(request.customer_id).await?;
        let write_set = self.build_write_set(&request, &quote);

        let deposit = match self.deposits.create(&write_set).await {
            Ok(deposit) => deposit,
            Err(DepositRepositoryError::DuplicateReference { reference }) => {
                let Some(key) = &request.gateway_reference else {
                    return Err(Error::internal(format!(
                        "duplicate payment reference {reference} without a request reference"
                    )));
                };
                return self.replay(key).await?.ok_or_else(|| {
                    Error::internal("payment reference disappeared during replay")
                });
            }
            Err(err) => return Err(map_deposit_error(err)),
        };

        info!(
            deposit_id = %deposit.id,
            customer_id = %deposit.customer_id,
            amount = deposit.amount,
            method = %request.method,
            vehicles = quote.items.len(),
            "deposit placed"
        );
        let vehicle_name = quote
            .items
            .iter()
            .map(|item| item.vehicle.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.publish(DepositEventKind::Created, &deposit, customer, vehicle_name)
            .await;
        Ok(DepositPlacement::Created(deposit))
    }

    async fn update_status(
        &self,
        caller: UserId,
        id: DepositId,
        next: DepositStatus,
    ) -> Result<Deposit, Error> {
        self.require_back_office(caller).await?;
        let (detail, customer) = self.load_for_mutation(id).await?;
        let change = self
            .deposits
            .update_status(id, next)
            .await
            .map_err(map_deposit_error)?;

        info!(
            deposit_id = %id,
            from = %change.previous,
            to = %change.deposit.status,
            "deposit status updated"
        );
        self.publish(
            DepositEventKind::Updated,
            &change.deposit,
            customer,
            vehicle_label(&detail),
        )
        .await;
        Ok(change.deposit)
    }

    async fn cancel(&self, caller: UserId, id: DepositId) -> Result<Deposit, Error> {
        let actor = self.require_user(caller).await?;
        let (detail, customer) = self.load_for_mutation(id).await?;
        if !actor.role.is_back_office() {
            if detail.deposit.customer_id != actor.id {
                return Err(Error::forbidden("cannot cancel another customer's deposit"));
            }
            if !detail.deposit.status.is_open() {
                return Err(Error::conflict(format!(
                    "deposit {id} is {} and can no longer be cancelled",
                    detail.deposit.status.label()
                )));
            }
        }

        let cancelled = self.deposits.cancel(id).await.map_err(map_deposit_error)?;
        info!(
            deposit_id = %id,
            released = cancelled.released_vehicles.len(),
            "deposit cancelled"
        );
        let mut deposit = cancelled.deposit;
        deposit.status = DepositStatus::Cancelled;
        self.publish(
            DepositEventKind::Cancelled,
            &deposit,
            customer,
            vehicle_label(&detail),
        )
        .await;
        Ok(deposit)
    }
}

#[async_trait]
impl DepositQuery for DepositService {
    async fn detail(&self, caller: UserId, id: DepositId) -> Result<DepositDetail, Error> {
        let actor = self.require_user(caller).await?;
        let detail = self
            .deposits
            .find_detail(id)
            .await
            .map_err(map_deposit_error)?
            .ok_or_else(|| Error::not_found(format!("deposit {id} not found")))?;
        if actor.role.is_back_office() || detail.deposit.customer_id == actor.id {
            Ok(detail)
        } else {
            Err(Error::forbidden("cannot view another customer's deposit"))
        }
    }

    async fn list(
        &self,
        caller: UserId,
        status: Option<DepositStatus>,
    ) -> Result<Vec<Deposit>, Error> {
        let actor = self.require_user(caller).await?;
        let filter = DepositFilter {
            status,
            customer_id: (!actor.role.is_back_office()).then_some(actor.id),
        };
        self.deposits.list(filter).await.map_err(map_deposit_error)
    }
}

/// Price a selection against the live catalogue.
pub(crate) async fn price_selection(
    vehicles: &dyn VehicleRepository,
    selections: &[VehicleSelection],
    percentage: DepositPercentage,
) -> Result<DepositQuote, Error> {
    let merged = merge_selections(selections).map_err(map_pricing_error)?;
    let ids: Vec<_> = merged.iter().map(|selection| selection.vehicle_id).collect();
    let catalogue = vehicles.find_many(&ids).await.map_err(map_vehicle_error)?;
    quote_deposit(&merged, percentage, &catalogue).map_err(map_pricing_error)
}

/// The catalogue must still price the order at the quoted total.
fn check_settlement(quote: &DepositQuote, settlement: CardSettlement) -> Result<(), Error> {
    if quote.total_price != settlement.quoted_total {
        return Err(Error::conflict("vehicle prices changed after the payment was quoted")
            .with_details(json!({
                "quotedTotal": settlement.quoted_total,
                "currentTotal": quote.total_price,
            })));
    }
    if settlement.collected < quote.deposit_amount {
        warn!(
            deposit_amount = quote.deposit_amount,
            collected = settlement.collected,
            shortfall = quote.deposit_amount.saturating_sub(settlement.collected),
            "card charge covers only part of the deposit"
        );
    }
    Ok(())
}

fn vehicle_label(detail: &DepositDetail) -> String {
    match (&detail.vehicle, detail.deposit.vehicle_id) {
        (Some(vehicle), _) => vehicle.name.clone(),
        (None, Some(id)) => format!("#{id}"),
        (None, None) => "-".to_owned(),
    }
}

pub(crate) fn map_pricing_error(err: PricingError) -> Error {
    match err {
        PricingError::VehicleNotFound { vehicle_id } => {
            Error::not_found(format!("vehicle {vehicle_id} not found"))
                .with_details(json!({ "vehicleId": vehicle_id.get() }))
        }
        PricingError::ExceedsGatewayCeiling { requested, maximum } => {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "requested": requested, "maximum": maximum }))
        }
        PricingError::InvalidQuantity { vehicle_id } => Error::invalid_request(err.to_string())
            .with_details(json!({ "vehicleId": vehicle_id.get() })),
        PricingError::EmptySelection | PricingError::Overflow => {
            Error::invalid_request(err.to_string())
        }
    }
}

pub(crate) fn map_deposit_error(err: DepositRepositoryError) -> Error {
    match err {
        DepositRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("deposit store unavailable: {message}"))
        }
        DepositRepositoryError::Query { message } => {
            Error::internal(format!("deposit store error: {message}"))
        }
        DepositRepositoryError::VehicleNotFound { vehicle_id } => {
            Error::not_found(format!("vehicle {vehicle_id} not found"))
                .with_details(json!({ "vehicleId": vehicle_id.get() }))
        }
        DepositRepositoryError::VehicleUnavailable { vehicle_id, name } => Error::conflict(
            format!("vehicle {name} is already reserved"),
        )
        .with_details(json!({ "vehicleId": vehicle_id.get(), "name": name })),
        DepositRepositoryError::DuplicateReference { reference } => {
            Error::internal(format!("unexpected duplicate payment reference {reference}"))
        }
        DepositRepositoryError::NotFound { deposit_id } => {
            Error::not_found(format!("deposit {deposit_id} not found"))
        }
        DepositRepositoryError::IllegalTransition { from, to } => Error::conflict(format!(
            "deposit cannot move from {} to {}",
            from.label(),
            to.label()
        ))
        .with_details(json!({ "from": from.as_str(), "to": to.as_str() })),
    }
}

pub(crate) fn map_vehicle_error(err: VehicleRepositoryError) -> Error {
    match err {
        VehicleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("vehicle catalogue unavailable: {message}"))
        }
        VehicleRepositoryError::Query { message } => {
            Error::internal(format!("vehicle catalogue error: {message}"))
        }
    }
}

pub(crate) fn map_user_error(err: UserDirectoryError) -> Error {
    match err {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}
