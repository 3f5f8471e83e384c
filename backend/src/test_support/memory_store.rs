//! In-memory dealership store implementing the persistence ports.
//!
//! Each mutating call works on a copy of the tables and swaps it in only on
//! success, so a failed write set leaves nothing behind, matching the
//! transactional contract of the Diesel adapters.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    CancelledDeposit, DepositFilter, DepositRepository, DepositRepositoryError, NewDeposit,
    NotificationRepository, NotificationRepositoryError, StatusChange, UserDirectory,
    UserDirectoryError, VehicleRepository, VehicleRepositoryError,
};
use crate::domain::{
    Deposit, DepositDetail, DepositId, DepositLineItem, DepositStatus, GatewayIntentId,
    NewNotification, Notification, NotificationId, Payment, PickupSchedule, Role, User, UserId,
    Vehicle, VehicleId, VehicleStatus,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    deposits: BTreeMap<DepositId, Deposit>,
    line_items: Vec<DepositLineItem>,
    pickups: Vec<PickupSchedule>,
    payments: Vec<Payment>,
    notifications: Vec<Notification>,
    next_id: i32,
    fail_payment_inserts: bool,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn set_vehicle_status(&mut self, ids: &[VehicleId], status: &VehicleStatus) {
        for id in ids {
            if let Some(vehicle) = self.vehicles.get_mut(id) {
                vehicle.status = status.clone();
            }
        }
    }

    fn covered_vehicles(&self, deposit: &Deposit) -> Vec<VehicleId> {
        let mut ids: Vec<VehicleId> = self
            .line_items
            .iter()
            .filter(|item| item.deposit_id == Some(deposit.id))
            .map(|item| item.vehicle_id)
            .chain(deposit.vehicle_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn insert_write_set(&mut self, new: &NewDeposit) -> Result<Deposit, DepositRepositoryError> {
        let mut vehicle_ids: Vec<VehicleId> =
            new.line_items.iter().map(|item| item.vehicle_id).collect();
        vehicle_ids.sort_unstable();
        vehicle_ids.dedup();
        for id in &vehicle_ids {
            let vehicle = self
                .vehicles
                .get(id)
                .ok_or_else(|| DepositRepositoryError::vehicle_not_found(*id))?;
            if !vehicle.status.is_reservable() {
                return Err(DepositRepositoryError::vehicle_unavailable(
                    *id,
                    vehicle.name.clone(),
                ));
            }
        }
        self.set_vehicle_status(&vehicle_ids, &VehicleStatus::Reserved);

        let deposit = Deposit {
            id: DepositId::from_row(self.next_id()),
            customer_id: new.customer_id,
            vehicle_id: new.primary_vehicle(),
            amount: new.amount,
            status: DepositStatus::PendingConfirmation,
            created_at: new.created_at,
        };
        self.deposits.insert(deposit.id, deposit.clone());

        for item in &new.line_items {
            let existing = self.line_items.iter_mut().find(|row| {
                row.deposit_id == Some(deposit.id) && row.vehicle_id == item.vehicle_id
            });
            match existing {
                Some(row) => {
                    row.quantity = item.quantity;
                    row.unit_price = item.unit_price;
                }
                None => self.line_items.push(DepositLineItem {
                    deposit_id: Some(deposit.id),
                    vehicle_id: item.vehicle_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                }),
            }
        }

        self.pickups
            .extend(new.pickups.iter().map(|pickup| PickupSchedule {
                deposit_id: deposit.id,
                vehicle_id: pickup.vehicle_id,
                customer_id: new.customer_id,
                pickup_at: pickup.pickup_at,
                location: pickup.location.clone(),
            }));

        if self.fail_payment_inserts {
            return Err(DepositRepositoryError::query("payment insert failed"));
        }
        if let Some(reference) = &new.payment.gateway_reference {
            if self
                .payments
                .iter()
                .any(|payment| payment.gateway_reference.as_ref() == Some(reference))
            {
                return Err(DepositRepositoryError::duplicate_reference(reference.as_str()));
            }
        }
        self.payments.push(Payment {
            deposit_id: Some(deposit.id),
            method: new.payment.method,
            status: new.payment.status.clone(),
            gateway_reference: new.payment.gateway_reference.clone(),
            amount: new.payment.amount,
            paid_at: new.created_at,
        });
        Ok(deposit)
    }
}

/// Shared in-memory store; clones see the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `apply` against a copy and commit it only when it succeeds.
    fn atomically<T, E>(&self, apply: impl FnOnce(&mut Tables) -> Result<T, E>) -> Result<T, E> {
        let mut tables = self.tables();
        let mut working = tables.clone();
        let value = apply(&mut working)?;
        *tables = working;
        Ok(value)
    }

    /// Add an account and return its id.
    pub fn add_user(&self, role: Role, full_name: &str, email: Option<&str>) -> UserId {
        let mut tables = self.tables();
        let id = UserId::from_row(tables.next_id());
        tables.users.insert(
            id,
            User {
                id,
                role,
                full_name: full_name.to_owned(),
                email: email.map(str::to_owned),
                phone: None,
            },
        );
        id
    }

    /// Add an available vehicle and return its id.
    pub fn add_vehicle(&self, name: &str, price: i64) -> VehicleId {
        self.add_vehicle_with_status(name, price, VehicleStatus::Available)
    }

    /// Add a vehicle in `status` and return its id.
    pub fn add_vehicle_with_status(&self, name: &str, price: i64, status: VehicleStatus) -> VehicleId {
        let mut tables = self.tables();
        let id = VehicleId::from_row(tables.next_id());
        tables.vehicles.insert(
            id,
            Vehicle {
                id,
                name: name.to_owned(),
                price,
                color: "white".to_owned(),
                status,
                images: Vec::new(),
                specs: String::new(),
            },
        );
        id
    }

    /// Reprice a catalogue vehicle.
    pub fn set_price(&self, id: VehicleId, price: i64) -> bool {
        match self.tables().vehicles.get_mut(&id) {
            Some(vehicle) => {
                vehicle.price = price;
                true
            }
            None => false,
        }
    }

    /// Make every subsequent payment insert fail, aborting its write set.
    pub fn fail_payment_inserts(&self, fail: bool) {
        self.tables().fail_payment_inserts = fail;
    }

    /// Current status of a vehicle.
    pub fn vehicle_status(&self, id: VehicleId) -> Option<VehicleStatus> {
        self.tables().vehicles.get(&id).map(|vehicle| vehicle.status.clone())
    }

    /// Every deposit row.
    pub fn deposits(&self) -> Vec<Deposit> {
        self.tables().deposits.values().cloned().collect()
    }

    /// Every line item row, attached or detached.
    pub fn line_items(&self) -> Vec<DepositLineItem> {
        self.tables().line_items.clone()
    }

    /// Every pickup row.
    pub fn pickups(&self) -> Vec<PickupSchedule> {
        self.tables().pickups.clone()
    }

    /// Every payment row.
    pub fn payments(&self) -> Vec<Payment> {
        self.tables().payments.clone()
    }

    /// Notifications addressed to `user_id`, in insertion order.
    pub fn notifications_for(&self, user_id: UserId) -> Vec<Notification> {
        self.tables()
            .notifications
            .iter()
            .filter(|notification| notification.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DepositRepository for InMemoryStore {
    async fn create(&self, deposit: &NewDeposit) -> Result<Deposit, DepositRepositoryError> {
        self.atomically(|tables| tables.insert_write_set(deposit))
    }

    async fn find_payment_by_reference(
        &self,
        reference: &GatewayIntentId,
    ) -> Result<Option<Payment>, DepositRepositoryError> {
        Ok(self
            .tables()
            .payments
            .iter()
            .find(|payment| payment.gateway_reference.as_ref() == Some(reference))
            .cloned())
    }

    async fn find_detail(
        &self,
        id: DepositId,
    ) -> Result<Option<DepositDetail>, DepositRepositoryError> {
        let tables = self.tables();
        let Some(deposit) = tables.deposits.get(&id).cloned() else {
            return Ok(None);
        };
        let vehicle = deposit
            .vehicle_id
            .and_then(|vehicle_id| tables.vehicles.get(&vehicle_id).cloned());
        let customer = tables.users.get(&deposit.customer_id).cloned();
        let line_items = tables
            .line_items
            .iter()
            .filter(|item| item.deposit_id == Some(id))
            .cloned()
            .collect();
        let pickups = tables
            .pickups
            .iter()
            .filter(|pickup| pickup.deposit_id == id)
            .cloned()
            .collect();
        Ok(Some(DepositDetail {
            deposit,
            vehicle,
            customer,
            line_items,
            pickups,
        }))
    }

    async fn list(&self, filter: DepositFilter) -> Result<Vec<Deposit>, DepositRepositoryError> {
        let mut deposits: Vec<Deposit> = self
            .tables()
            .deposits
            .values()
            .filter(|deposit| filter.status.is_none_or(|status| deposit.status == status))
            .filter(|deposit| filter.customer_id.is_none_or(|id| deposit.customer_id == id))
            .cloned()
            .collect();
        deposits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(deposits)
    }

    async fn update_status(
        &self,
        id: DepositId,
        next: DepositStatus,
    ) -> Result<StatusChange, DepositRepositoryError> {
        self.atomically(|tables| {
            let current = tables
                .deposits
                .get(&id)
                .cloned()
                .ok_or_else(|| DepositRepositoryError::not_found(id))?;
            let previous = current.status;
            if !previous.can_transition_to(next) {
                return Err(DepositRepositoryError::illegal_transition(previous, next));
            }
            let deposit = Deposit {
                status: next,
                ..current
            };
            if previous != next {
                let vehicles = tables.covered_vehicles(&deposit);
                match next {
                    DepositStatus::Cancelled => {
                        tables.set_vehicle_status(&vehicles, &VehicleStatus::Available);
                    }
                    DepositStatus::Completed => {
                        tables.set_vehicle_status(&vehicles, &VehicleStatus::SoldOut);
                    }
                    DepositStatus::PendingConfirmation | DepositStatus::Confirmed => {}
                }
            }
            tables.deposits.insert(id, deposit.clone());
            Ok(StatusChange { previous, deposit })
        })
    }

    async fn cancel(&self, id: DepositId) -> Result<CancelledDeposit, DepositRepositoryError> {
        self.atomically(|tables| {
            let deposit = tables
                .deposits
                .get(&id)
                .cloned()
                .ok_or_else(|| DepositRepositoryError::not_found(id))?;
            let released_vehicles = if deposit.status.is_open() {
                tables.covered_vehicles(&deposit)
            } else {
                Vec::new()
            };
            tables.pickups.retain(|pickup| pickup.deposit_id != id);
            for item in &mut tables.line_items {
                if item.deposit_id == Some(id) {
                    item.deposit_id = None;
                }
            }
            for payment in &mut tables.payments {
                if payment.deposit_id == Some(id) {
                    payment.deposit_id = None;
                }
            }
            tables.deposits.remove(&id);
            tables.set_vehicle_status(&released_vehicles, &VehicleStatus::Available);
            Ok(CancelledDeposit {
                deposit,
                released_vehicles,
            })
        })
    }
}

#[async_trait]
impl VehicleRepository for InMemoryStore {
    async fn list(
        &self,
        status: Option<VehicleStatus>,
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        Ok(self
            .tables()
            .vehicles
            .values()
            .filter(|vehicle| status.as_ref().is_none_or(|status| &vehicle.status == status))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        Ok(self.tables().vehicles.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[VehicleId]) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        let tables = self.tables();
        Ok(tables
            .vehicles
            .values()
            .filter(|vehicle| ids.contains(&vehicle.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserDirectoryError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserDirectoryError> {
        Ok(self.tables().users.values().cloned().collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, NotificationRepositoryError> {
        let mut tables = self.tables();
        let stored = Notification {
            id: NotificationId::from_row(tables.next_id()),
            user_id: notification.user_id,
            kind: notification.kind,
            message: notification.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        tables.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut notifications = self.notifications_for(user_id);
        notifications.reverse();
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut tables = self.tables();
        match tables
            .notifications
            .iter_mut()
            .find(|notification| notification.id == id && notification.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{NewLineItem, NewPayment, NewPickup};
    use crate::domain::PaymentMethod;
    use rstest::{fixture, rstest};

    struct Seeded {
        store: InMemoryStore,
        customer: UserId,
        vehicle: VehicleId,
    }

    #[fixture]
    fn seeded() -> Seeded {
        let store = InMemoryStore::new();
        let customer = store.add_user(Role::Customer, "Lan", None);
        let vehicle = store.add_vehicle("VF8", 1_000_000_000);
        Seeded {
            store,
            customer,
            vehicle,
        }
    }

    fn write_set(customer: UserId, vehicle: VehicleId, reference: Option<&str>) -> NewDeposit {
        NewDeposit {
            customer_id: customer,
            amount: 200_000_000,
            created_at: Utc::now(),
            line_items: vec![NewLineItem {
                vehicle_id: vehicle,
                quantity: 1,
                unit_price: 1_000_000_000,
            }],
            pickups: vec![NewPickup {
                vehicle_id: vehicle,
                pickup_at: None,
                location: Some("Showroom".to_owned()),
            }],
            payment: NewPayment {
                method: PaymentMethod::Card,
                status: "paid".to_owned(),
                gateway_reference: reference
                    .map(|raw| GatewayIntentId::new(raw).expect("valid reference")),
                amount: 200_000_000,
            },
        }
    }

    #[rstest]
    #[tokio::test]
    async fn failed_write_sets_leave_no_trace(seeded: Seeded) {
        seeded.store.fail_payment_inserts(true);

        let err = seeded
            .store
            .create(&write_set(seeded.customer, seeded.vehicle, None))
            .await
            .expect_err("payment insert fails");

        assert!(matches!(err, DepositRepositoryError::Query { .. }));
        assert!(seeded.store.deposits().is_empty());
        assert!(seeded.store.line_items().is_empty());
        assert!(seeded.store.pickups().is_empty());
        assert_eq!(
            seeded.store.vehicle_status(seeded.vehicle),
            Some(VehicleStatus::Available)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_references_are_rejected(seeded: Seeded) {
        let other = seeded.store.add_vehicle("VF9", 1_500_000_000);
        seeded
            .store
            .create(&write_set(seeded.customer, seeded.vehicle, Some("pi_1")))
            .await
            .expect("first write");

        let err = seeded
            .store
            .create(&write_set(seeded.customer, other, Some("pi_1")))
            .await
            .expect_err("duplicate");

        assert!(matches!(err, DepositRepositoryError::DuplicateReference { .. }));
        assert_eq!(seeded.store.deposits().len(), 1);
        assert_eq!(seeded.store.vehicle_status(other), Some(VehicleStatus::Available));
    }

    #[rstest]
    #[tokio::test]
    async fn cancel_detaches_and_releases(seeded: Seeded) {
        let deposit = seeded
            .store
            .create(&write_set(seeded.customer, seeded.vehicle, Some("pi_2")))
            .await
            .expect("write");

        let cancelled = seeded.store.cancel(deposit.id).await.expect("cancel");

        assert_eq!(cancelled.released_vehicles, vec![seeded.vehicle]);
        assert!(seeded.store.deposits().is_empty());
        assert!(seeded.store.pickups().is_empty());
        assert!(seeded.store.line_items().iter().all(|item| item.deposit_id.is_none()));
        assert!(seeded.store.payments().iter().all(|p| p.deposit_id.is_none()));
        assert_eq!(
            seeded.store.vehicle_status(seeded.vehicle),
            Some(VehicleStatus::Available)
        );
    }
}
