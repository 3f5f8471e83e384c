//! Integer identifiers for the dealership aggregates.
//!
//! Rows use `SERIAL` primary keys, so each identifier wraps an `i32` and
//! rejects non-positive values at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation failure raised when an identifier is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} id must be a positive integer, got {value}")]
pub struct InvalidId {
    /// Identifier kind, for example `vehicle`.
    pub kind: &'static str,
    /// Offending value.
    pub value: i64,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i32")]
        pub struct $name(i32);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(value: i64) -> Result<Self, InvalidId> {
                match i32::try_from(value) {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(InvalidId { kind: $kind, value }),
                }
            }

            /// Wrap a value read back from storage.
            pub(crate) const fn from_row(value: i32) -> Self {
                Self(value)
            }

            /// Raw integer value.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = InvalidId;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(
    /// Catalogue vehicle identifier.
    VehicleId,
    "vehicle"
);
define_id!(
    /// User account identifier (customers, staff and admins).
    UserId,
    "user"
);
define_id!(
    /// Deposit identifier.
    DepositId,
    "deposit"
);
define_id!(
    /// In-app notification identifier.
    NotificationId,
    "notification"
);
