//! Domain primitives, services and ports.
//!
//! Purpose: model the dealership deposit flow independently of HTTP and
//! storage. Entities are plain data; [`DepositService`] and
//! [`PaymentService`] orchestrate them through the traits in [`ports`].
//!
//! Public surface:
//! - Error and ErrorCode: API error payload and its stable identifiers.
//! - Vehicle, User, Deposit, Payment, PickupSchedule: persisted entities.
//! - `quote_deposit` and [`GatewayPricing`]: the pricing calculator.
//! - [`NotificationFanout`]: post-commit notifications and email.

pub mod deposit;
mod deposit_service;
pub mod email_templates;
pub mod error;
pub mod ids;
pub mod notification;
mod notification_fanout;
pub mod payment;
pub mod payment_intent;
mod payment_service;
pub mod pickup;
pub mod ports;
pub mod pricing;
pub mod trace_id;
pub mod user;
pub mod vehicle;

pub use self::deposit::{
    Deposit, DepositDetail, DepositLineItem, DepositStatus, UnknownDepositStatus,
};
pub use self::deposit_service::{DepositService, DepositServicePorts, DepositSettings};
pub use self::email_templates::{EmailMessage, render_deposit_email};
pub use self::error::{Error, ErrorCode, ErrorPayloadError};
pub use self::ids::{DepositId, InvalidId, NotificationId, UserId, VehicleId};
pub use self::notification::{
    DepositEvent, DepositEventKind, NewNotification, Notification, RecipientPolicy, Recipients,
    UnknownNotificationKind, format_vnd,
};
pub use self::notification_fanout::{FanoutReport, NotificationFanout};
pub use self::payment::{
    GatewayIntentId, InvalidGatewayIntentId, Payment, PaymentMethod, UnknownPaymentMethod,
};
pub use self::payment_intent::{
    DepositIntentMetadata, IntentMetadataError, MAX_METADATA_VALUE_CHARS,
};
pub use self::payment_service::{PaymentService, PaymentServicePorts};
pub use self::pickup::{PickupPolicy, PickupRequest, PickupSchedule, ResolvedPickup};
pub use self::pricing::{
    CeilingPolicy, DepositPercentage, DepositQuote, GatewayCharge, GatewayPricing, PricedItem,
    PricingError, UnsupportedPercentage, VehicleSelection, merge_selections, quote_deposit,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Role, UnknownRole, User};
pub use self::vehicle::{Vehicle, VehicleStatus};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use showroom::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("staff only"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
