//! Post-commit fan-out of deposit events to in-app notifications and email.
//!
//! Runs after the deposit transaction has committed, so nothing here can
//! fail the request: every error is logged and counted in the returned
//! [`FanoutReport`].

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::ports::{EmailSender, NotificationRepository, UserDirectory};
use super::{DepositEvent, NewNotification, RecipientPolicy, render_deposit_email};

/// Counts from one fan-out run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanoutReport {
    /// Notifications written.
    pub delivered: usize,
    /// Notifications that failed to write.
    pub failed: usize,
    /// Whether the customer email was handed to the provider.
    pub emailed: bool,
}

/// Publishes deposit events to every recipient selected by the policy.
#[derive(Clone)]
pub struct NotificationFanout {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserDirectory>,
    email: Arc<dyn EmailSender>,
    policy: RecipientPolicy,
}

impl NotificationFanout {
    /// Create a fan-out over the given ports.
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserDirectory>,
        email: Arc<dyn EmailSender>,
        policy: RecipientPolicy,
    ) -> Self {
        Self {
            notifications,
            users,
            email,
            policy,
        }
    }

    /// Write one notification per recipient and email the customer.
    ///
    /// Inserts run concurrently; their relative order is unspecified.
    pub async fn publish(&self, event: &DepositEvent) -> FanoutReport {
        let accounts = match self.users.list_all().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(
                    deposit_id = %event.deposit_id,
                    error = %err,
                    "could not list accounts; notifying the customer only"
                );
                Vec::new()
            }
        };
        let recipients = self.policy.recipients(event, &accounts);

        let mut pending = Vec::with_capacity(recipients.len());
        if let Some(customer) = recipients.customer {
            pending.push(NewNotification {
                user_id: customer,
                kind: event.kind,
                message: event.customer_message(),
            });
        }
        let staff_message = event.staff_message();
        pending.extend(recipients.others.iter().map(|user_id| NewNotification {
            user_id: *user_id,
            kind: event.kind,
            message: staff_message.clone(),
        }));

        let results = join_all(
            pending
                .iter()
                .map(|notification| self.notifications.insert(notification)),
        )
        .await;

        let mut report = FanoutReport::default();
        for (notification, result) in pending.iter().zip(results) {
            match result {
                Ok(_) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        deposit_id = %event.deposit_id,
                        recipient = %notification.user_id,
                        error = %err,
                        "notification insert failed"
                    );
                }
            }
        }

        report.emailed = self.send_email(event).await;
        debug!(
            deposit_id = %event.deposit_id,
            kind = %event.kind,
            delivered = report.delivered,
            failed = report.failed,
            emailed = report.emailed,
            "deposit fan-out finished"
        );
        report
    }

    async fn send_email(&self, event: &DepositEvent) -> bool {
        let Some(message) = render_deposit_email(event) else {
            debug!(deposit_id = %event.deposit_id, "customer has no email address");
            return false;
        };
        match self.email.send(&message).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    deposit_id = %event.deposit_id,
                    recipient = %event.customer.id,
                    error = %err,
                    "deposit email failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        EmailSenderError, MockEmailSender, MockNotificationRepository, MockUserDirectory,
        NotificationRepositoryError, UserDirectoryError,
    };
    use crate::domain::{
        DepositEventKind, DepositId, DepositStatus, Notification, NotificationId, Role, User,
        UserId,
    };
    use chrono::Utc;
    use rstest::{fixture, rstest};

    fn user(id: i64, role: Role, email: Option<&str>) -> User {
        User {
            id: UserId::new(id).expect("valid id"),
            role,
            full_name: format!("User {id}"),
            email: email.map(str::to_owned),
            phone: None,
        }
    }

    #[fixture]
    fn event() -> DepositEvent {
        DepositEvent {
            kind: DepositEventKind::Created,
            deposit_id: DepositId::new(9).expect("valid id"),
            customer: user(3, Role::Customer, Some("c@example.com")),
            vehicle_name: "VF8".to_owned(),
            amount: 200_000_000,
            status: DepositStatus::PendingConfirmation,
        }
    }

    fn stored(notification: &NewNotification) -> Notification {
        Notification {
            id: NotificationId::new(1).expect("valid id"),
            user_id: notification.user_id,
            kind: notification.kind,
            message: notification.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    fn directory(accounts: Vec<User>) -> MockUserDirectory {
        let mut users = MockUserDirectory::new();
        users
            .expect_list_all()
            .returning(move || Ok(accounts.clone()));
        users
    }

    fn email_ok() -> MockEmailSender {
        let mut email = MockEmailSender::new();
        email.expect_send().times(1).returning(|_| Ok(()));
        email
    }

    #[rstest]
    #[tokio::test]
    async fn notifies_customer_and_each_back_office_account(event: DepositEvent) {
        let users = directory(vec![
            user(1, Role::Admin, None),
            user(2, Role::Staff, None),
            user(3, Role::Customer, Some("c@example.com")),
            user(4, Role::Customer, None),
        ]);
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .withf(|n| n.user_id.get() == 3 && n.message.starts_with("Bạn đã đặt cọc"))
            .times(1)
            .returning(|n| Ok(stored(n)));
        notifications
            .expect_insert()
            .withf(|n| matches!(n.user_id.get(), 1 | 2) && n.message.contains("User 3"))
            .times(2)
            .returning(|n| Ok(stored(n)));

        let fanout = NotificationFanout::new(
            Arc::new(notifications),
            Arc::new(users),
            Arc::new(email_ok()),
            RecipientPolicy::default(),
        );
        let report = fanout.publish(&event).await;

        assert_eq!(
            report,
            FanoutReport {
                delivered: 3,
                failed: 0,
                emailed: true
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn insert_failures_are_counted_not_raised(event: DepositEvent) {
        let users = directory(vec![user(2, Role::Staff, None)]);
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .returning(|_| Err(NotificationRepositoryError::query("disk full")));

        let fanout = NotificationFanout::new(
            Arc::new(notifications),
            Arc::new(users),
            Arc::new(email_ok()),
            RecipientPolicy::default(),
        );
        let report = fanout.publish(&event).await;

        assert_eq!(report.delivered, 0);
        assert_eq!(report.failed, 2);
        assert!(report.emailed);
    }

    #[rstest]
    #[tokio::test]
    async fn directory_failure_still_reaches_the_customer(event: DepositEvent) {
        let mut users = MockUserDirectory::new();
        users
            .expect_list_all()
            .returning(|| Err(UserDirectoryError::connection("down")));
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .times(1)
            .returning(|n| Ok(stored(n)));
        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .returning(|_| Err(EmailSenderError::transport("smtp down")));

        let fanout = NotificationFanout::new(
            Arc::new(notifications),
            Arc::new(users),
            Arc::new(email),
            RecipientPolicy::default(),
        );
        let report = fanout.publish(&event).await;

        assert_eq!(report.delivered, 1);
        assert!(!report.emailed);
    }

    #[rstest]
    #[tokio::test]
    async fn skips_email_without_address(mut event: DepositEvent) {
        event.customer.email = None;
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().returning(|n| Ok(stored(n)));
        let mut email = MockEmailSender::new();
        email.expect_send().never();

        let fanout = NotificationFanout::new(
            Arc::new(notifications),
            Arc::new(directory(Vec::new())),
            Arc::new(email),
            RecipientPolicy::default(),
        );
        let report = fanout.publish(&event).await;

        assert!(!report.emailed);
        assert_eq!(report.delivered, 1);
    }
}
