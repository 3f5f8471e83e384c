//! PostgreSQL-backed deposit aggregate.
//!
//! Every mutation runs in one transaction. Reservation locks the selected
//! vehicle rows with `SELECT ... FOR UPDATE` in id order, so two concurrent
//! deposits for the same vehicle serialise and the loser sees it reserved.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    CancelledDeposit, DepositFilter, DepositRepository, DepositRepositoryError, NewDeposit,
    StatusChange,
};
use crate::domain::{
    Deposit, DepositDetail, DepositId, DepositLineItem, DepositStatus, GatewayIntentId, Payment,
    PickupSchedule, User, Vehicle, VehicleId, VehicleStatus,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    DepositRow, LineItemRow, NewDepositRow, NewLineItemRow, NewPaymentRow, NewPickupRow,
    PaymentRow, PickupRow, UserRow, VehicleRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{deposit_line_items, deposits, payments, pickup_schedules, users, vehicles};

const GATEWAY_REFERENCE_KEY: &str = "payments_gateway_reference_key";

/// Diesel implementation of [`DepositRepository`].
#[derive(Clone)]
pub struct DieselDepositRepository {
    pool: DbPool,
}

impl DieselDepositRepository {
    /// Create a repository on `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a transaction closure: either Diesel or a domain rule.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Rule(DepositRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<DepositRepositoryError> for TxError {
    fn from(error: DepositRepositoryError) -> Self {
        Self::Rule(error)
    }
}

fn map_pool_error(error: PoolError) -> DepositRepositoryError {
    map_basic_pool_error(error, DepositRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
    error: diesel::result::Error,
) -> DepositRepositoryError {
    map_basic_diesel_error(
        error,
        operation,
        DepositRepositoryError::query,
        DepositRepositoryError::connection,
    )
}

fn map_tx_error(operation: &'static str) -> impl FnOnce(TxError) -> DepositRepositoryError {
    move |error| match error {
        TxError::Rule(rule) => rule,
        TxError::Diesel(error) => map_diesel_error(operation, error),
    }
}

fn to_deposit(row: DepositRow) -> Result<Deposit, DepositRepositoryError> {
    Deposit::try_from(row).map_err(DepositRepositoryError::query)
}

/// Lock the deposit row and return it, or `NotFound`.
async fn lock_deposit(conn: &mut AsyncPgConnection, id: DepositId) -> Result<Deposit, TxError> {
    let row = deposits::table
        .find(id.get())
        .select(DepositRow::as_select())
        .for_update()
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| DepositRepositoryError::not_found(id))?;
    Ok(to_deposit(row)?)
}

/// Vehicles covered by a deposit: its line items plus its primary vehicle.
async fn covered_vehicles(
    conn: &mut AsyncPgConnection,
    deposit: &Deposit,
) -> Result<Vec<i32>, TxError> {
    let mut ids: Vec<i32> = deposit_line_items::table
        .filter(deposit_line_items::deposit_id.eq(deposit.id.get()))
        .select(deposit_line_items::vehicle_id)
        .load(conn)
        .await?;
    if let Some(primary) = deposit.vehicle_id {
        ids.push(primary.get());
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

async fn set_vehicle_status(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
    status: &VehicleStatus,
) -> Result<(), TxError> {
    if ids.is_empty() {
        return Ok(());
    }
    diesel::update(vehicles::table.filter(vehicles::id.eq_any(ids)))
        .set(vehicles::status.eq(status.as_str()))
        .execute(conn)
        .await?;
    Ok(())
}

/// Lock every requested vehicle and check it can be reserved.
async fn lock_reservable(
    conn: &mut AsyncPgConnection,
    requested: &[VehicleId],
) -> Result<Vec<i32>, TxError> {
    let mut ids: Vec<i32> = requested.iter().map(|id| id.get()).collect();
    ids.sort_unstable();
    ids.dedup();
    let locked: Vec<VehicleRow> = vehicles::table
        .filter(vehicles::id.eq_any(&ids))
        .order_by(vehicles::id)
        .select(VehicleRow::as_select())
        .for_update()
        .load(conn)
        .await?;

    for id in &ids {
        let Some(row) = locked.iter().find(|row| row.id == *id) else {
            let missing = VehicleId::from_row(*id);
            return Err(DepositRepositoryError::vehicle_not_found(missing).into());
        };
        let vehicle = Vehicle::from(row.clone());
        if !vehicle.status.is_reservable() {
            return Err(
                DepositRepositoryError::vehicle_unavailable(vehicle.id, vehicle.name).into(),
            );
        }
    }
    Ok(ids)
}

async fn insert_write_set(
    conn: &mut AsyncPgConnection,
    deposit: &NewDeposit,
) -> Result<Deposit, TxError> {
    let requested: Vec<VehicleId> =
        deposit.line_items.iter().map(|item| item.vehicle_id).collect();
    let locked = lock_reservable(conn, &requested).await?;
    set_vehicle_status(conn, &locked, &VehicleStatus::Reserved).await?;

    let row: DepositRow = diesel::insert_into(deposits::table)
        .values(NewDepositRow {
            customer_id: deposit.customer_id.get(),
            vehicle_id: deposit.primary_vehicle().map(VehicleId::get),
            amount: deposit.amount,
            status: DepositStatus::PendingConfirmation.as_str(),
            created_at: deposit.created_at,
        })
        .returning(DepositRow::as_returning())
        .get_result(conn)
        .await?;
    let created = to_deposit(row)?;

    let items: Vec<NewLineItemRow> = deposit
        .line_items
        .iter()
        .map(|item| NewLineItemRow {
            deposit_id: Some(created.id.get()),
            vehicle_id: item.vehicle_id.get(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();
    diesel::insert_into(deposit_line_items::table)
        .values(&items)
        .on_conflict((deposit_line_items::deposit_id, deposit_line_items::vehicle_id))
        .do_update()
        .set((
            deposit_line_items::quantity.eq(excluded(deposit_line_items::quantity)),
            deposit_line_items::unit_price.eq(excluded(deposit_line_items::unit_price)),
        ))
        .execute(conn)
        .await?;

    let pickups: Vec<NewPickupRow<'_>> = deposit
        .pickups
        .iter()
        .map(|pickup| NewPickupRow {
            deposit_id: created.id.get(),
            vehicle_id: pickup.vehicle_id.get(),
            customer_id: deposit.customer_id.get(),
            pickup_at: pickup.pickup_at,
            location: pickup.location.as_deref(),
        })
        .collect();
    if !pickups.is_empty() {
        diesel::insert_into(pickup_schedules::table)
            .values(&pickups)
            .execute(conn)
            .await?;
    }

    let payment = &deposit.payment;
    diesel::insert_into(payments::table)
        .values(NewPaymentRow {
            deposit_id: Some(created.id.get()),
            amount: payment.amount,
            method: payment.method.as_str(),
            status: &payment.status,
            gateway_reference: payment.gateway_reference.as_ref().map(GatewayIntentId::as_str),
            paid_at: deposit.created_at,
        })
        .execute(conn)
        .await
        .map_err(|error| {
            if is_unique_violation(&error, GATEWAY_REFERENCE_KEY) {
                let reference = payment
                    .gateway_reference
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                TxError::Rule(DepositRepositoryError::duplicate_reference(reference))
            } else {
                TxError::Diesel(error)
            }
        })?;

    Ok(created)
}

#[async_trait]
impl DepositRepository for DieselDepositRepository {
    async fn create(&self, deposit: &NewDeposit) -> Result<Deposit, DepositRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move { insert_write_set(conn, deposit).await }.scope_boxed()
        })
        .await
        .map_err(map_tx_error("create deposit"))
    }

    async fn find_payment_by_reference(
        &self,
        reference: &GatewayIntentId,
    ) -> Result<Option<Payment>, DepositRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentRow> = payments::table
            .filter(payments::gateway_reference.eq(reference.as_str()))
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_diesel_error("find payment", error))?;
        row.map(|row| Payment::try_from(row).map_err(DepositRepositoryError::query))
            .transpose()
    }

    async fn find_detail(
        &self,
        id: DepositId,
    ) -> Result<Option<DepositDetail>, DepositRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let read = |error| map_diesel_error("load deposit detail", error);

        let Some(row) = deposits::table
            .find(id.get())
            .select(DepositRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(read)?
        else {
            return Ok(None);
        };
        let deposit = to_deposit(row)?;

        let vehicle = match deposit.vehicle_id {
            Some(vehicle_id) => vehicles::table
                .find(vehicle_id.get())
                .select(VehicleRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(read)?
                .map(Vehicle::from),
            None => None,
        };
        let customer = users::table
            .find(deposit.customer_id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(read)?
            .map(|row| User::try_from(row).map_err(DepositRepositoryError::query))
            .transpose()?;
        let line_items: Vec<LineItemRow> = deposit_line_items::table
            .filter(deposit_line_items::deposit_id.eq(id.get()))
            .select(LineItemRow::as_select())
            .order_by(deposit_line_items::vehicle_id)
            .load(&mut conn)
            .await
            .map_err(read)?;
        let pickups: Vec<PickupRow> = pickup_schedules::table
            .filter(pickup_schedules::deposit_id.eq(id.get()))
            .select(PickupRow::as_select())
            .order_by(pickup_schedules::vehicle_id)
            .load(&mut conn)
            .await
            .map_err(read)?;

        Ok(Some(DepositDetail {
            deposit,
            vehicle,
            customer,
            line_items: line_items.into_iter().map(DepositLineItem::from).collect(),
            pickups: pickups.into_iter().map(PickupSchedule::from).collect(),
        }))
    }

    async fn list(&self, filter: DepositFilter) -> Result<Vec<Deposit>, DepositRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = deposits::table
            .select(DepositRow::as_select())
            .order_by((deposits::created_at.desc(), deposits::id.desc()))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(deposits::status.eq(status.as_str()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(deposits::customer_id.eq(customer_id.get()));
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error("list deposits", error))?;
        rows.into_iter().map(to_deposit).collect()
    }

    async fn update_status(
        &self,
        id: DepositId,
        next: DepositStatus,
    ) -> Result<StatusChange, DepositRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let current = lock_deposit(conn, id).await?;
                let previous = current.status;
                if !previous.can_transition_to(next) {
                    return Err(DepositRepositoryError::illegal_transition(previous, next).into());
                }
                let row: DepositRow = diesel::update(deposits::table.find(id.get()))
                    .set(deposits::status.eq(next.as_str()))
                    .returning(DepositRow::as_returning())
                    .get_result(conn)
                    .await?;
                let deposit = to_deposit(row)?;

                if previous != next {
                    let released = match next {
                        DepositStatus::Cancelled => Some(VehicleStatus::Available),
                        DepositStatus::Completed => Some(VehicleStatus::SoldOut),
                        DepositStatus::PendingConfirmation | DepositStatus::Confirmed => None,
                    };
                    if let Some(status) = released {
                        let ids = covered_vehicles(conn, &deposit).await?;
                        set_vehicle_status(conn, &ids, &status).await?;
                        debug!(
                            deposit_id = %id,
                            vehicles = ?ids,
                            status = status.as_str(),
                            "vehicle status follows deposit"
                        );
                    }
                }
                Ok(StatusChange { previous, deposit })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error("update deposit status"))
    }

    async fn cancel(&self, id: DepositId) -> Result<CancelledDeposit, DepositRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let deposit = lock_deposit(conn, id).await?;
                // Closed deposits already handed their vehicles on.
                let vehicle_ids = if deposit.status.is_open() {
                    covered_vehicles(conn, &deposit).await?
                } else {
                    Vec::new()
                };

                diesel::delete(
                    pickup_schedules::table.filter(pickup_schedules::deposit_id.eq(id.get())),
                )
                .execute(conn)
                .await?;
                diesel::update(
                    deposit_line_items::table.filter(deposit_line_items::deposit_id.eq(id.get())),
                )
                .set(deposit_line_items::deposit_id.eq(None::<i32>))
                .execute(conn)
                .await?;
                diesel::update(payments::table.filter(payments::deposit_id.eq(id.get())))
                    .set(payments::deposit_id.eq(None::<i32>))
                    .execute(conn)
                    .await?;
                diesel::delete(deposits::table.find(id.get()))
                    .execute(conn)
                    .await?;
                set_vehicle_status(conn, &vehicle_ids, &VehicleStatus::Available).await?;

                Ok(CancelledDeposit {
                    deposit,
                    released_vehicles: vehicle_ids.into_iter().map(VehicleId::from_row).collect(),
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error("cancel deposit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rule_errors_pass_through_transactions() {
        let id = DepositId::new(4).expect("valid id");
        let mapped = map_tx_error("cancel deposit")(TxError::Rule(
            DepositRepositoryError::not_found(id),
        ));
        assert_eq!(mapped, DepositRepositoryError::not_found(id));
    }

    #[rstest]
    fn diesel_errors_become_query_errors() {
        let mapped = map_tx_error("create deposit")(TxError::Diesel(
            diesel::result::Error::RollbackTransaction,
        ));
        assert!(matches!(mapped, DepositRepositoryError::Query { .. }));
    }
}
