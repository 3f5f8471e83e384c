//! Wire representations shared by the deposit, payment and catalogue
//! handlers.
//!
//! Field names follow the storefront client: vehicle selections use `idXe`
//! and `SoLuong`, everything else is camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::DepositPlacement;
use crate::domain::{
    Deposit, DepositDetail, DepositLineItem, DepositPercentage, Error, Notification,
    PickupRequest, PickupSchedule, User, Vehicle, VehicleId, VehicleSelection,
};

const fn default_quantity() -> i32 {
    1
}

/// One selected vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelectionDto {
    /// Vehicle id.
    #[serde(rename = "idXe")]
    #[schema(example = 11)]
    pub vehicle_id: i64,
    /// Units; defaults to one.
    #[serde(rename = "SoLuong", default = "default_quantity")]
    #[schema(example = 1)]
    pub quantity: i32,
}

/// Convert wire selections into domain selections.
pub fn parse_selections(raw: &[SelectionDto]) -> Result<Vec<VehicleSelection>, Error> {
    if raw.is_empty() {
        return Err(Error::invalid_request("at least one vehicle must be selected")
            .with_details(json!({ "field": "vehicles" })));
    }
    raw.iter()
        .map(|entry| {
            let vehicle_id = VehicleId::new(entry.vehicle_id).map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": "idXe", "value": entry.vehicle_id }))
            })?;
            Ok(VehicleSelection {
                vehicle_id,
                quantity: entry.quantity,
            })
        })
        .collect()
}

/// Validate the deposit percentage against the allow-list; absent means
/// full payment.
pub fn parse_percentage(raw: Option<i64>) -> Result<DepositPercentage, Error> {
    let Some(value) = raw else {
        return Ok(DepositPercentage::DEFAULT);
    };
    DepositPercentage::new(value).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "depositPercentage",
            "allowed": DepositPercentage::ALLOWED,
        }))
    })
}

/// Build a pickup request when the caller proposed a time.
pub fn parse_pickup(
    pickup_at: Option<DateTime<Utc>>,
    location: Option<String>,
) -> Option<PickupRequest> {
    pickup_at.map(|at| PickupRequest {
        pickup_at: at,
        location: location.filter(|loc| !loc.trim().is_empty()),
    })
}

/// Catalogue vehicle.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDto {
    /// Vehicle id.
    #[schema(example = 11)]
    pub id: i32,
    /// Display name.
    #[schema(example = "VinFast VF8")]
    pub name: String,
    /// Unit price in VND.
    #[schema(example = 1_000_000_000)]
    pub price: i64,
    /// Paint colour.
    pub color: String,
    /// `available`, `reserved`, `sold_out` or a staff display string.
    #[schema(example = "available")]
    pub status: String,
    /// Image URLs.
    pub images: Vec<String>,
    /// Free-form specification text.
    pub specs: String,
}

impl From<Vehicle> for VehicleDto {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id.get(),
            name: vehicle.name,
            price: vehicle.price,
            color: vehicle.color,
            status: vehicle.status.as_str().to_owned(),
            images: vehicle.images,
            specs: vehicle.specs,
        }
    }
}

/// Customer contact summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    /// User id.
    pub id: i32,
    /// Name shown to staff.
    pub full_name: String,
    /// `customer`, `staff` or `admin`.
    #[schema(example = "customer")]
    pub role: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
}

impl From<User> for CustomerDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.get(),
            full_name: user.full_name,
            role: user.role.as_str().to_owned(),
            email: user.email,
            phone: user.phone,
        }
    }
}

/// Deposit summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositDto {
    /// Deposit id.
    pub id: i32,
    /// Paying customer.
    pub customer_id: i32,
    /// Primary vehicle; null once it is deleted from the catalogue.
    pub vehicle_id: Option<i32>,
    /// Deposit amount in VND.
    pub amount: i64,
    /// Wire status.
    #[schema(example = "pending_confirmation")]
    pub status: String,
    /// Vietnamese display label.
    #[schema(example = "Chờ xác nhận")]
    pub status_label: String,
    /// When the deposit was placed.
    pub created_at: DateTime<Utc>,
}

impl From<Deposit> for DepositDto {
    fn from(deposit: Deposit) -> Self {
        Self {
            id: deposit.id.get(),
            customer_id: deposit.customer_id.get(),
            vehicle_id: deposit.vehicle_id.map(VehicleId::get),
            amount: deposit.amount,
            status: deposit.status.as_str().to_owned(),
            status_label: deposit.status.label().to_owned(),
            created_at: deposit.created_at,
        }
    }
}

/// Line item linking a deposit and a vehicle.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDto {
    /// Reserved vehicle.
    pub vehicle_id: i32,
    /// Units reserved.
    pub quantity: i32,
    /// Catalogue price at placement, in VND.
    pub unit_price: i64,
}

impl From<DepositLineItem> for LineItemDto {
    fn from(item: DepositLineItem) -> Self {
        Self {
            vehicle_id: item.vehicle_id.get(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// Pickup appointment; `pickupAt` is null until staff schedule it.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PickupDto {
    /// Vehicle to collect.
    pub vehicle_id: i32,
    /// Collecting customer.
    pub customer_id: i32,
    /// Appointment time.
    pub pickup_at: Option<DateTime<Utc>>,
    /// Appointment location.
    pub location: Option<String>,
    /// True while staff still have to schedule the pickup.
    pub unscheduled: bool,
}

impl From<PickupSchedule> for PickupDto {
    fn from(pickup: PickupSchedule) -> Self {
        Self {
            unscheduled: pickup.is_unscheduled(),
            vehicle_id: pickup.vehicle_id.get(),
            customer_id: pickup.customer_id.get(),
            pickup_at: pickup.pickup_at,
            location: pickup.location,
        }
    }
}

/// Deposit with its vehicle, customer, line items and pickups.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositDetailDto {
    /// Deposit summary, flattened into the object.
    #[serde(flatten)]
    pub deposit: DepositDto,
    /// Primary vehicle.
    pub vehicle: Option<VehicleDto>,
    /// Paying customer.
    pub customer: Option<CustomerDto>,
    /// Reserved vehicles.
    pub line_items: Vec<LineItemDto>,
    /// Pickup appointments.
    pub pickups: Vec<PickupDto>,
}

impl From<DepositDetail> for DepositDetailDto {
    fn from(detail: DepositDetail) -> Self {
        Self {
            deposit: detail.deposit.into(),
            vehicle: detail.vehicle.map(Into::into),
            customer: detail.customer.map(Into::into),
            line_items: detail.line_items.into_iter().map(Into::into).collect(),
            pickups: detail.pickups.into_iter().map(Into::into).collect(),
        }
    }
}

/// Envelope for deposit writes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositEnvelope {
    /// Always true; failures use the error body.
    pub success: bool,
    /// True when the payment had already been processed.
    pub replayed: bool,
    /// Null when a replayed deposit has since been cancelled.
    pub data: Option<DepositDto>,
    /// Note for the storefront, e.g. on replays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DepositEnvelope {
    /// Successful write carrying `deposit`.
    pub fn written(deposit: Deposit) -> Self {
        Self {
            success: true,
            replayed: false,
            data: Some(deposit.into()),
            message: None,
        }
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<DepositPlacement> for DepositEnvelope {
    fn from(placement: DepositPlacement) -> Self {
        match placement {
            DepositPlacement::Created(deposit) => Self::written(deposit),
            DepositPlacement::Replayed(deposit) => Self {
                success: true,
                replayed: true,
                message: Some(match deposit {
                    Some(_) => "payment already processed".to_owned(),
                    None => "payment already processed; the deposit has since been cancelled"
                        .to_owned(),
                }),
                data: deposit.map(Into::into),
            },
        }
    }
}

/// In-app notification.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    /// Notification id.
    pub id: i32,
    /// Event kind.
    #[serde(rename = "type")]
    #[schema(example = "deposit_created")]
    pub kind: String,
    /// Rendered message.
    pub message: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it was written.
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.get(),
            kind: notification.kind.as_str().to_owned(),
            message: notification.message,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}
