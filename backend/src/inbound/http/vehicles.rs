//! Public vehicle catalogue.
//!
//! ```text
//! GET /api/v1/vehicles?status=
//! GET /api/v1/vehicles/{id}
//! ```

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::VehicleRepositoryError;
use crate::domain::{Error, VehicleId, VehicleStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::VehicleDto;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Catalogue filter.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleListQuery {
    /// `available`, `reserved`, `sold_out` or a display string.
    pub status: Option<String>,
}

fn map_catalogue_error(err: VehicleRepositoryError) -> Error {
    match err {
        VehicleRepositoryError::Connection { message } => Error::service_unavailable(message),
        VehicleRepositoryError::Query { message } => Error::internal(message),
    }
}

/// List catalogue vehicles.
#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    params(VehicleListQuery),
    responses(
        (status = 200, description = "Vehicles ordered by id", body = [VehicleDto]),
        (status = 503, description = "Catalogue unavailable", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "listVehicles"
)]
#[get("/vehicles")]
pub async fn list_vehicles(
    state: web::Data<HttpState>,
    query: web::Query<VehicleListQuery>,
) -> ApiResult<HttpResponse> {
    let status = query
        .status
        .as_deref()
        .map(|raw| raw.parse::<VehicleStatus>().unwrap_or_else(|never| match never {}));
    let vehicles = state.vehicles.list(status).await.map_err(map_catalogue_error)?;
    let body: Vec<VehicleDto> = vehicles.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Fetch one vehicle.
#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    params(("id" = i64, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle", body = VehicleDto),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Vehicle not found", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "getVehicle"
)]
#[get("/vehicles/{id}")]
pub async fn get_vehicle(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = VehicleId::new(path.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let vehicle = state
        .vehicles
        .find_by_id(id)
        .await
        .map_err(map_catalogue_error)?
        .ok_or_else(|| Error::not_found(format!("vehicle {id} not found")))?;
    Ok(HttpResponse::Ok().json(VehicleDto::from(vehicle)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::Vehicle;
    use crate::domain::ports::MockVehicleRepository;
    use crate::inbound::http::state::HttpStatePorts;

    fn vf8() -> Vehicle {
        Vehicle {
            id: VehicleId::new(11).expect("valid id"),
            name: "VinFast VF8".to_owned(),
            price: 1_000_000_000,
            color: "blue".to_owned(),
            status: VehicleStatus::Available,
            images: vec!["vf8.png".to_owned()],
            specs: "AWD".to_owned(),
        }
    }

    async fn get(repo: MockVehicleRepository, uri: &str) -> (StatusCode, Value) {
        let ports = HttpStatePorts {
            vehicles: Arc::new(repo),
            ..HttpStatePorts::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::new(ports)))
                .service(
                    web::scope("/api/v1")
                        .service(list_vehicles)
                        .service(get_vehicle),
                ),
        )
        .await;
        let response =
            test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = response.status();
        (status, test::read_body_json(response).await)
    }

    #[rstest]
    #[case("/api/v1/vehicles", None)]
    #[case("/api/v1/vehicles?status=reserved", Some(VehicleStatus::Reserved))]
    #[case("/api/v1/vehicles?status=H%E1%BA%BFt%20h%C3%A0ng", Some(VehicleStatus::SoldOut))]
    #[actix_web::test]
    async fn listing_passes_the_filter(
        #[case] uri: &str,
        #[case] expected: Option<VehicleStatus>,
    ) {
        let mut repo = MockVehicleRepository::new();
        repo.expect_list()
            .withf(move |status| *status == expected)
            .times(1)
            .returning(|_| Ok(vec![vf8()]));

        let (status, body) = get(repo, uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.pointer("/0/name"), Some(&json!("VinFast VF8")));
        assert_eq!(body.pointer("/0/status"), Some(&json!("available")));
    }

    #[actix_web::test]
    async fn missing_vehicle_is_not_found() {
        let mut repo = MockVehicleRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let (status, body) = get(repo, "/api/v1/vehicles/99").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.get("code"), Some(&json!("not_found")));
    }

    #[actix_web::test]
    async fn unreachable_catalogue_is_unavailable() {
        let mut repo = MockVehicleRepository::new();
        repo.expect_list()
            .returning(|_| Err(VehicleRepositoryError::connection("pool exhausted")));

        let (status, _) = get(repo, "/api/v1/vehicles").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
