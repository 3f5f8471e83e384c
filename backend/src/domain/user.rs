//! User accounts as seen by the deposit flow.
//!
//! Profile editing lives elsewhere; this module only models what the flow
//! reads: role for recipient selection and contact fields for messages.

use std::fmt;
use std::str::FromStr;

use super::UserId;

/// Account role. Stored as a role id foreign key in the legacy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Buys vehicles and places deposits.
    Customer,
    /// Showroom employee handling deposits.
    Staff,
    /// Back-office administrator.
    Admin,
}

/// Unknown role string read from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }

    /// Legacy numeric role id (`1` admin, `2` staff, `3` customer).
    pub const fn legacy_id(self) -> i32 {
        match self {
            Self::Admin => 1,
            Self::Staff => 2,
            Self::Customer => 3,
        }
    }

    /// Staff and admins receive every deposit notification.
    pub const fn is_back_office(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "customer" | "3" => Ok(Self::Customer),
            "staff" | "2" => Ok(Self::Staff),
            "admin" | "1" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Role governing notification fan-out and back-office access.
    pub role: Role,
    /// Name used in notification messages.
    pub full_name: String,
    /// Address for confirmation emails.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Role::Customer)]
    #[case(Role::Staff)]
    #[case(Role::Admin)]
    fn storage_and_legacy_ids_parse_back(#[case] role: Role) {
        assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        assert_eq!(role.legacy_id().to_string().parse::<Role>(), Ok(role));
    }

    #[rstest]
    fn only_staff_and_admin_are_back_office() {
        assert!(Role::Staff.is_back_office());
        assert!(Role::Admin.is_back_office());
        assert!(!Role::Customer.is_back_office());
    }
}
