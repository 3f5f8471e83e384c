//! Read port for the vehicle catalogue.

use async_trait::async_trait;

use crate::domain::{Vehicle, VehicleId, VehicleStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by vehicle catalogue adapters.
    pub enum VehicleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "vehicle repository connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } => "vehicle repository query failed: {message}",
    }
}

/// Catalogue lookups used by pricing and the public listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// List vehicles ordered by id, optionally filtered by status.
    async fn list(
        &self,
        status: Option<VehicleStatus>,
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError>;

    /// Fetch one vehicle.
    async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, VehicleRepositoryError>;

    /// Fetch every vehicle whose id appears in `ids`; unknown ids are
    /// silently absent from the result.
    async fn find_many(&self, ids: &[VehicleId]) -> Result<Vec<Vehicle>, VehicleRepositoryError>;
}

/// Fixture catalogue with no vehicles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVehicleRepository;

#[async_trait]
impl VehicleRepository for FixtureVehicleRepository {
    async fn list(
        &self,
        _status: Option<VehicleStatus>,
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: VehicleId) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        Ok(None)
    }

    async fn find_many(&self, _ids: &[VehicleId]) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        Ok(Vec::new())
    }
}
