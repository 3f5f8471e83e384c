//! Read-only access to user accounts.
//!
//! Deposits only ever read users: to resolve the caller's role, to name the
//! customer in notifications, and to enumerate fan-out recipients.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user directory connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } => "user directory query failed: {message}",
    }
}

/// Driven port resolving accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch one account.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserDirectoryError>;

    /// Every account, ordered by id.
    async fn list_all(&self) -> Result<Vec<User>, UserDirectoryError>;
}

/// Fixture directory with no accounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn find_by_id(&self, _id: UserId) -> Result<Option<User>, UserDirectoryError> {
        Ok(None)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserDirectoryError> {
        Ok(Vec::new())
    }
}
