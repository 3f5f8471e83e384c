//! PostgreSQL-backed vehicle catalogue.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{VehicleRepository, VehicleRepositoryError};
use crate::domain::{Vehicle, VehicleId, VehicleStatus};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::VehicleRow;
use super::pool::{DbPool, PoolError};
use super::schema::vehicles;

/// Diesel implementation of [`VehicleRepository`].
#[derive(Clone)]
pub struct DieselVehicleRepository {
    pool: DbPool,
}

impl DieselVehicleRepository {
    /// Create a repository on `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> VehicleRepositoryError {
    map_basic_pool_error(error, VehicleRepositoryError::connection)
}

fn map_diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> VehicleRepositoryError {
    move |error| {
        map_basic_diesel_error(
            error,
            operation,
            VehicleRepositoryError::query,
            VehicleRepositoryError::connection,
        )
    }
}

#[async_trait]
impl VehicleRepository for DieselVehicleRepository {
    async fn list(
        &self,
        status: Option<VehicleStatus>,
    ) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = vehicles::table
            .select(VehicleRow::as_select())
            .order_by(vehicles::id)
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(vehicles::status.eq(status.as_str().to_owned()));
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list vehicles"))?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    async fn find_by_id(&self, id: VehicleId) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = vehicles::table
            .find(id.get())
            .select(VehicleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find vehicle"))?;
        Ok(row.map(Vehicle::from))
    }

    async fn find_many(&self, ids: &[VehicleId]) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = vehicles::table
            .filter(vehicles::id.eq_any(raw))
            .select(VehicleRow::as_select())
            .order_by(vehicles::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("load vehicles"))?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }
}
