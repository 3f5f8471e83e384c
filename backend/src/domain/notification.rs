//! In-app notifications emitted around deposit lifecycle events.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{DepositId, DepositStatus, NotificationId, User, UserId};

/// Deposit lifecycle event that triggers a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositEventKind {
    /// A deposit was placed.
    Created,
    /// Staff changed the deposit status.
    Updated,
    /// The deposit was cancelled and removed.
    Cancelled,
}

/// Unknown notification type tag read from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification type: {0}")]
pub struct UnknownNotificationKind(pub String);

impl DepositEventKind {
    /// Type tag stored on the notification row.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "deposit_created",
            Self::Updated => "deposit_updated",
            Self::Cancelled => "deposit_cancelled",
        }
    }
}

impl FromStr for DepositEventKind {
    type Err = UnknownNotificationKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "deposit_created" => Ok(Self::Created),
            "deposit_updated" => Ok(Self::Updated),
            "deposit_cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownNotificationKind(other.to_owned())),
        }
    }
}

impl fmt::Display for DepositEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a fan-out needs to describe one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    /// Event type.
    pub kind: DepositEventKind,
    /// Affected deposit.
    pub deposit_id: DepositId,
    /// Deposit owner.
    pub customer: User,
    /// Name of the primary vehicle.
    pub vehicle_name: String,
    /// Deposit amount in catalogue units.
    pub amount: i64,
    /// Status after the event.
    pub status: DepositStatus,
}

impl DepositEvent {
    /// Message shown to the customer.
    pub fn customer_message(&self) -> String {
        let amount = format_vnd(self.amount);
        match self.kind {
            DepositEventKind::Created => format!(
                "Bạn đã đặt cọc {amount} cho xe {vehicle}. Trạng thái: {status}.",
                vehicle = self.vehicle_name,
                status = self.status.label(),
            ),
            DepositEventKind::Updated => format!(
                "Đơn đặt cọc #{id} cho xe {vehicle} ({amount}) đã được cập nhật: {status}.",
                id = self.deposit_id,
                vehicle = self.vehicle_name,
                status = self.status.label(),
            ),
            DepositEventKind::Cancelled => format!(
                "Đơn đặt cọc #{id} cho xe {vehicle} ({amount}) đã bị hủy.",
                id = self.deposit_id,
                vehicle = self.vehicle_name,
            ),
        }
    }

    /// Message shown to staff, admins and (when broadcasting) other customers.
    pub fn staff_message(&self) -> String {
        let amount = format_vnd(self.amount);
        match self.kind {
            DepositEventKind::Created => format!(
                "Khách hàng {customer} đã đặt cọc {amount} cho xe {vehicle}. Trạng thái: {status}.",
                customer = self.customer.full_name,
                vehicle = self.vehicle_name,
                status = self.status.label(),
            ),
            DepositEventKind::Updated => format!(
                "Đơn đặt cọc #{id} của {customer} cho xe {vehicle} ({amount}) chuyển sang: {status}.",
                id = self.deposit_id,
                customer = self.customer.full_name,
                vehicle = self.vehicle_name,
                status = self.status.label(),
            ),
            DepositEventKind::Cancelled => format!(
                "Đơn đặt cọc #{id} của {customer} cho xe {vehicle} ({amount}) đã bị hủy.",
                id = self.deposit_id,
                customer = self.customer.full_name,
                vehicle = self.vehicle_name,
            ),
        }
    }
}

/// Format an amount as `1.000.000.000 VND`.
pub fn format_vnd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut reversed: Vec<char> = Vec::with_capacity(digits.len() * 2);
    let mut run = 0;
    for ch in digits.chars().rev() {
        if run == 3 {
            reversed.push('.');
            run = 0;
        }
        reversed.push(ch);
        run += 1;
    }
    let grouped: String = reversed.into_iter().rev().collect();
    if amount < 0 {
        format!("-{grouped} VND")
    } else {
        format!("{grouped} VND")
    }
}

/// Who receives a deposit notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecipientPolicy {
    /// Also notify every other customer on update and cancellation.
    pub broadcast_to_customers: bool,
}

/// Recipients for one event, split by message variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipients {
    /// Receives [`DepositEvent::customer_message`].
    pub customer: Option<UserId>,
    /// Receive [`DepositEvent::staff_message`].
    pub others: BTreeSet<UserId>,
}

impl Recipients {
    /// Total number of notifications to write.
    pub fn len(&self) -> usize {
        self.others.len() + usize::from(self.customer.is_some())
    }

    /// Whether nobody is notified.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecipientPolicy {
    /// Select recipients from the known accounts.
    ///
    /// The customer always gets exactly one notification, every staff or
    /// admin account gets one, and other customers are included only for
    /// updates and cancellations when broadcasting is enabled.
    pub fn recipients(self, event: &DepositEvent, accounts: &[User]) -> Recipients {
        let customer_id = event.customer.id;
        let broadcast = self.broadcast_to_customers
            && matches!(
                event.kind,
                DepositEventKind::Updated | DepositEventKind::Cancelled
            );
        let others = accounts
            .iter()
            .filter(|user| user.id != customer_id)
            .filter(|user| user.role.is_back_office() || broadcast)
            .map(|user| user.id)
            .collect();
        Recipients {
            customer: Some(customer_id),
            others,
        }
    }
}

/// Notification to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Type tag.
    pub kind: DepositEventKind,
    /// Rendered message.
    pub message: String,
}

/// Stored notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Primary key.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Type tag.
    pub kind: DepositEventKind,
    /// Rendered message.
    pub message: String,
    /// Whether the recipient has opened it.
    pub is_read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
