//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer. Conversions into domain
//! values return `String` errors that the adapters wrap as query failures.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Deposit, DepositEventKind, DepositId, DepositLineItem, DepositStatus, GatewayIntentId,
    Notification, NotificationId, Payment, PaymentMethod, PickupSchedule, Role, User, UserId,
    Vehicle, VehicleId, VehicleStatus,
};

use super::schema::{
    deposit_line_items, deposits, notifications, payments, pickup_schedules, users, vehicles,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_row(row.id),
            role: row.role.parse::<Role>().map_err(|err| err.to_string())?,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = vehicles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VehicleRow {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub color: String,
    pub status: String,
    pub images: Vec<String>,
    pub specs: String,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        let status = match row.status.parse::<VehicleStatus>() {
            Ok(status) => status,
            Err(never) => match never {},
        };
        Self {
            id: VehicleId::from_row(row.id),
            name: row.name,
            price: row.price,
            color: row.color,
            status,
            images: row.images,
            specs: row.specs,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = deposits)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DepositRow {
    pub id: i32,
    pub customer_id: i32,
    pub vehicle_id: Option<i32>,
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DepositRow {
    pub(crate) fn status(&self) -> Result<DepositStatus, String> {
        self.status
            .parse::<DepositStatus>()
            .map_err(|err| err.to_string())
    }
}

impl TryFrom<DepositRow> for Deposit {
    type Error = String;

    fn try_from(row: DepositRow) -> Result<Self, Self::Error> {
        let status = row.status()?;
        Ok(Self {
            id: DepositId::from_row(row.id),
            customer_id: UserId::from_row(row.customer_id),
            vehicle_id: row.vehicle_id.map(VehicleId::from_row),
            amount: row.amount,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = deposits)]
pub(crate) struct NewDepositRow<'a> {
    pub customer_id: i32,
    pub vehicle_id: Option<i32>,
    pub amount: i64,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = deposit_line_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LineItemRow {
    pub deposit_id: Option<i32>,
    pub vehicle_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

impl From<LineItemRow> for DepositLineItem {
    fn from(row: LineItemRow) -> Self {
        Self {
            deposit_id: row.deposit_id.map(DepositId::from_row),
            vehicle_id: VehicleId::from_row(row.vehicle_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = deposit_line_items)]
pub(crate) struct NewLineItemRow {
    pub deposit_id: Option<i32>,
    pub vehicle_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pickup_schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PickupRow {
    pub deposit_id: i32,
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub pickup_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl From<PickupRow> for PickupSchedule {
    fn from(row: PickupRow) -> Self {
        Self {
            deposit_id: DepositId::from_row(row.deposit_id),
            vehicle_id: VehicleId::from_row(row.vehicle_id),
            customer_id: UserId::from_row(row.customer_id),
            pickup_at: row.pickup_at,
            location: row.location,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pickup_schedules)]
pub(crate) struct NewPickupRow<'a> {
    pub deposit_id: i32,
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub pickup_at: Option<DateTime<Utc>>,
    pub location: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub deposit_id: Option<i32>,
    pub amount: i64,
    pub method: String,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = String;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let gateway_reference = row
            .gateway_reference
            .map(GatewayIntentId::new)
            .transpose()
            .map_err(|_| "empty gateway reference".to_owned())?;
        Ok(Self {
            deposit_id: row.deposit_id.map(DepositId::from_row),
            method: row
                .method
                .parse::<PaymentMethod>()
                .map_err(|err| err.to_string())?,
            status: row.status,
            gateway_reference,
            amount: row.amount,
            paid_at: row.paid_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub deposit_id: Option<i32>,
    pub amount: i64,
    pub method: &'a str,
    pub status: &'a str,
    pub gateway_reference: Option<&'a str>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: i32,
    pub user_id: i32,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = String;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::from_row(row.id),
            user_id: UserId::from_row(row.user_id),
            kind: row
                .kind
                .parse::<DepositEventKind>()
                .map_err(|err| err.to_string())?,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub user_id: i32,
    pub kind: &'a str,
    pub message: &'a str,
}
