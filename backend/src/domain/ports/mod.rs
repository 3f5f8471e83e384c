//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod deposit_command;
mod deposit_query;
mod deposit_repository;
mod email_sender;
mod notification_repository;
mod payment_command;
mod payment_gateway;
mod user_directory;
mod vehicle_repository;

#[cfg(test)]
pub use deposit_command::MockDepositCommand;
pub use deposit_command::{
    CardSettlement, DepositCommand, DepositPlacement, FixtureDepositCommand, PlaceDepositRequest,
};
#[cfg(test)]
pub use deposit_query::MockDepositQuery;
pub use deposit_query::{DepositQuery, FixtureDepositQuery};
#[cfg(test)]
pub use deposit_repository::MockDepositRepository;
pub use deposit_repository::{
    CancelledDeposit, DepositFilter, DepositRepository, DepositRepositoryError,
    FixtureDepositRepository, NewDeposit, NewLineItem, NewPayment, NewPickup, StatusChange,
};
#[cfg(test)]
pub use email_sender::MockEmailSender;
pub use email_sender::{EmailSender, EmailSenderError};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    FixtureNotificationRepository, NotificationRepository, NotificationRepositoryError,
};
#[cfg(test)]
pub use payment_command::MockPaymentCommand;
pub use payment_command::{
    ConfirmRequest, FixturePaymentCommand, PaymentCommand, PaymentQuote, QuoteRequest,
};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    CreatedIntent, DisabledPaymentGateway, IntentRequest, IntentStatus, PaymentGateway,
    PaymentGatewayError, RetrievedIntent,
};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
#[cfg(test)]
pub use vehicle_repository::MockVehicleRepository;
pub use vehicle_repository::{FixtureVehicleRepository, VehicleRepository, VehicleRepositoryError};
