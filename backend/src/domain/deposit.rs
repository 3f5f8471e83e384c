//! Deposits, their line items and the status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{DepositId, PickupSchedule, User, UserId, Vehicle, VehicleId};

/// Lifecycle of a deposit.
///
/// ```text
/// pending_confirmation ──► confirmed ──► completed
///          │                   │
///          └──────► cancelled ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepositStatus {
    /// Created by the orchestrator; awaiting staff review.
    PendingConfirmation,
    /// Accepted by staff.
    Confirmed,
    /// Vehicle handed over.
    Completed,
    /// Withdrawn by the customer or staff.
    Cancelled,
}

/// Status string that matches no known state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown deposit status: {0}")]
pub struct UnknownDepositStatus(pub String);

impl DepositStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::PendingConfirmation,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingConfirmation => "pending_confirmation",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Vietnamese label used in customer-facing messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingConfirmation => "Chờ xác nhận",
            Self::Confirmed => "Đã xác nhận",
            Self::Completed => "Hoàn thành",
            Self::Cancelled => "Đã hủy",
        }
    }

    /// Whether the deposit still holds its vehicle.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::PendingConfirmation | Self::Confirmed)
    }

    /// Whether moving from `self` to `next` is permitted.
    ///
    /// Re-applying the current status is allowed so staff can re-send
    /// notifications.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::PendingConfirmation, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }
}

impl FromStr for DepositStatus {
    type Err = UnknownDepositStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "pending_confirmation" | "Chờ xác nhận" => Ok(Self::PendingConfirmation),
            "confirmed" | "Đã xác nhận" => Ok(Self::Confirmed),
            "completed" | "Hoàn thành" => Ok(Self::Completed),
            "cancelled" | "Đã hủy" => Ok(Self::Cancelled),
            other => Err(UnknownDepositStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deposit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    /// Primary key.
    pub id: DepositId,
    /// Customer who placed the deposit.
    pub customer_id: UserId,
    /// Primary reserved vehicle (first of the selection).
    pub vehicle_id: Option<VehicleId>,
    /// Deposit amount in catalogue currency units.
    pub amount: i64,
    /// Lifecycle state.
    pub status: DepositStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Association between a deposit and a vehicle it covers.
///
/// `deposit_id` becomes `None` once the deposit is cancelled; line items are
/// retained for reporting rather than cascade-deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositLineItem {
    /// Owning deposit, if still present.
    pub deposit_id: Option<DepositId>,
    /// Covered vehicle.
    pub vehicle_id: VehicleId,
    /// Units reserved.
    pub quantity: i32,
    /// Unit price at reservation time.
    pub unit_price: i64,
}

/// Deposit with its related rows, as returned by `GET /deposit/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositDetail {
    /// Deposit row.
    pub deposit: Deposit,
    /// Primary vehicle, if still linked.
    pub vehicle: Option<Vehicle>,
    /// Customer, if the account still exists.
    pub customer: Option<User>,
    /// Line items.
    pub line_items: Vec<DepositLineItem>,
    /// Pickup appointments.
    pub pickups: Vec<PickupSchedule>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use DepositStatus::{Cancelled, Completed, Confirmed, PendingConfirmation};

    #[rstest]
    #[case(PendingConfirmation, Confirmed, true)]
    #[case(PendingConfirmation, Cancelled, true)]
    #[case(PendingConfirmation, Completed, false)]
    #[case(Confirmed, Completed, true)]
    #[case(Confirmed, Cancelled, true)]
    #[case(Confirmed, PendingConfirmation, false)]
    #[case(Completed, Cancelled, false)]
    #[case(Cancelled, Confirmed, false)]
    #[case(Cancelled, Cancelled, true)]
    fn transition_table(
        #[case] from: DepositStatus,
        #[case] to: DepositStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn storage_strings_and_labels_parse_back() {
        for status in DepositStatus::ALL {
            assert_eq!(status.as_str().parse::<DepositStatus>(), Ok(status));
            assert_eq!(status.label().parse::<DepositStatus>(), Ok(status));
        }
    }

    #[rstest]
    fn unknown_strings_are_rejected() {
        assert_eq!(
            "on hold".parse::<DepositStatus>(),
            Err(UnknownDepositStatus("on hold".to_owned()))
        );
    }

    #[rstest]
    fn only_pending_and_confirmed_hold_vehicles() {
        let open: Vec<_> = DepositStatus::ALL.into_iter().filter(|s| s.is_open()).collect();
        assert_eq!(open, vec![PendingConfirmation, Confirmed]);
    }
}
