//! PostgreSQL adapters for the showroom ports.
//!
//! Repositories translate between Diesel rows (`models`, `schema`) and
//! domain types. Multi-row writes run in a single transaction with vehicle
//! rows locked `FOR UPDATE` in id order.

mod diesel_basic_error_mapping;
mod diesel_deposit_repository;
mod diesel_notification_repository;
mod diesel_user_directory;
mod diesel_vehicle_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_deposit_repository::DieselDepositRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use diesel_vehicle_repository::DieselVehicleRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
