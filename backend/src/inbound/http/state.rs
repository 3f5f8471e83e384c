//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    DepositCommand, DepositQuery, FixtureDepositCommand, FixtureDepositQuery,
    FixtureNotificationRepository, FixturePaymentCommand, FixtureVehicleRepository,
    NotificationRepository, PaymentCommand, VehicleRepository,
};

/// Parameter object bundling the ports handlers call.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Card payment flow.
    pub payments: Arc<dyn PaymentCommand>,
    /// Deposit writes.
    pub deposits: Arc<dyn DepositCommand>,
    /// Deposit reads.
    pub deposits_query: Arc<dyn DepositQuery>,
    /// Public catalogue.
    pub vehicles: Arc<dyn VehicleRepository>,
    /// In-app notifications.
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Default for HttpStatePorts {
    fn default() -> Self {
        Self {
            payments: Arc::new(FixturePaymentCommand),
            deposits: Arc::new(FixtureDepositCommand),
            deposits_query: Arc::new(FixtureDepositQuery),
            vehicles: Arc::new(FixtureVehicleRepository),
            notifications: Arc::new(FixtureNotificationRepository),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Card payment flow.
    pub payments: Arc<dyn PaymentCommand>,
    /// Deposit writes.
    pub deposits: Arc<dyn DepositCommand>,
    /// Deposit reads.
    pub deposits_query: Arc<dyn DepositQuery>,
    /// Public catalogue.
    pub vehicles: Arc<dyn VehicleRepository>,
    /// In-app notifications.
    pub notifications: Arc<dyn NotificationRepository>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use showroom::domain::ports::FixtureVehicleRepository;
    /// use showroom::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts {
    ///     vehicles: Arc::new(FixtureVehicleRepository),
    ///     ..HttpStatePorts::default()
    /// });
    /// let _vehicles = state.vehicles.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            payments,
            deposits,
            deposits_query,
            vehicles,
            notifications,
        } = ports;
        Self {
            payments,
            deposits,
            deposits_query,
            vehicles,
            notifications,
        }
    }
}
