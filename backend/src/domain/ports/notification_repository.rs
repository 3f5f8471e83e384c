//! Port for the append-only in-app notification store.

use async_trait::async_trait;

use crate::domain::{NewNotification, Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification store adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "notification store connection failed: {message}",
        /// Query or insert failed.
        Query { message: String } => "notification store query failed: {message}",
    }
}

/// Driven port storing in-app notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Append one notification.
    async fn insert(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, NotificationRepositoryError>;

    /// Notifications addressed to `user_id`, newest first.
    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark a notification read; returns `false` when it does not exist or
    /// belongs to someone else.
    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationRepositoryError>;
}

/// Fixture store that accepts nothing and remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationRepository;

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn insert(
        &self,
        _notification: &NewNotification,
    ) -> Result<Notification, NotificationRepositoryError> {
        Err(NotificationRepositoryError::connection(
            "fixture notification store is read-only",
        ))
    }

    async fn list_for_user(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn mark_read(
        &self,
        _user_id: UserId,
        _id: NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        Ok(false)
    }
}
