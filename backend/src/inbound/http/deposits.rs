//! Deposit endpoints.
//!
//! ```text
//! POST   /api/v1/deposits
//! GET    /api/v1/deposits?status=
//! GET    /api/v1/deposit/{id}
//! PUT    /api/v1/deposit/{id}
//! DELETE /api/v1/deposit/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::PlaceDepositRequest;
use crate::domain::{DepositId, DepositStatus, Error, PaymentMethod};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::dto::{
    DepositDetailDto, DepositDto, DepositEnvelope, SelectionDto, parse_percentage, parse_pickup,
    parse_selections,
};
use crate::inbound::http::identity::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Cash deposit request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepositRequest {
    /// Vehicles and quantities; duplicates are merged.
    #[serde(default)]
    pub vehicles: Vec<SelectionDto>,
    /// One of 10, 20, 30, 40, 50 or 100. Defaults to 100.
    #[schema(example = 30)]
    pub deposit_percentage: Option<i64>,
    /// Proposed pickup time.
    pub pickup_at: Option<DateTime<Utc>>,
    /// Proposed pickup location.
    pub pickup_location: Option<String>,
}

/// Status update body. Accepts wire values and the Vietnamese labels.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateDepositRequest {
    /// Target status.
    #[serde(rename = "TrangThaiDat")]
    #[schema(example = "confirmed")]
    pub status: String,
}

/// Listing filter.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepositListQuery {
    /// Only deposits in this status.
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> Result<DepositStatus, Error> {
    raw.parse().map_err(|_| {
        let allowed: Vec<_> = DepositStatus::ALL.iter().map(|s| s.as_str()).collect();
        Error::invalid_request(format!("unknown deposit status: {raw}"))
            .with_details(json!({ "field": "status", "allowed": allowed }))
    })
}

fn parse_deposit_id(raw: i64) -> Result<DepositId, Error> {
    DepositId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "id" }))
    })
}

/// Place a cash deposit.
#[utoipa::path(
    post,
    path = "/api/v1/deposits",
    request_body = CreateDepositRequest,
    params(("X-User-Id" = i64, Header, description = "Authenticated caller")),
    responses(
        (status = 201, description = "Deposit placed", body = DepositEnvelope),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Vehicle not found", body = ErrorSchema),
        (status = 409, description = "Vehicle already reserved", body = ErrorSchema)
    ),
    tags = ["deposits"],
    operation_id = "createDeposit"
)]
#[post("/deposits")]
pub async fn create_deposit(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<CreateDepositRequest>,
) -> ApiResult<HttpResponse> {
    let customer_id = caller.require()?;
    let request = payload.into_inner();
    let placement = state
        .deposits
        .place(PlaceDepositRequest {
            customer_id,
            selections: parse_selections(&request.vehicles)?,
            percentage: parse_percentage(request.deposit_percentage)?,
            method: PaymentMethod::Cash,
            gateway_reference: None,
            pickup: parse_pickup(request.pickup_at, request.pickup_location),
            settlement: None,
        })
        .await?;
    Ok(HttpResponse::Created().json(DepositEnvelope::from(placement)))
}

/// List deposits visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/deposits",
    params(
        DepositListQuery,
        ("X-User-Id" = i64, Header, description = "Authenticated caller")
    ),
    responses(
        (status = 200, description = "Deposits, newest first", body = [DepositDto]),
        (status = 400, description = "Unknown status filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["deposits"],
    operation_id = "listDeposits"
)]
#[get("/deposits")]
pub async fn list_deposits(
    state: web::Data<HttpState>,
    caller: Caller,
    query: web::Query<DepositListQuery>,
) -> ApiResult<HttpResponse> {
    let caller_id = caller.require()?;
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let deposits = state.deposits_query.list(caller_id, status).await?;
    let body: Vec<DepositDto> = deposits.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(body))
}

/// Fetch a deposit with its vehicle, customer and pickups.
#[utoipa::path(
    get,
    path = "/api/v1/deposit/{id}",
    params(
        ("id" = i64, Path, description = "Deposit id"),
        ("X-User-Id" = i64, Header, description = "Authenticated caller")
    ),
    responses(
        (status = 200, description = "Deposit detail", body = DepositDetailDto),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Deposit not found", body = ErrorSchema)
    ),
    tags = ["deposits"],
    operation_id = "getDeposit"
)]
#[get("/deposit/{id}")]
pub async fn get_deposit(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let caller_id = caller.require()?;
    let id = parse_deposit_id(path.into_inner())?;
    let detail = state.deposits_query.detail(caller_id, id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(DepositDetailDto::from(detail)))
}

/// Change a deposit's status (staff and admins).
#[utoipa::path(
    put,
    path = "/api/v1/deposit/{id}",
    request_body = UpdateDepositRequest,
    params(
        ("id" = i64, Path, description = "Deposit id"),
        ("X-User-Id" = i64, Header, description = "Authenticated caller")
    ),
    responses(
        (status = 200, description = "Updated deposit", body = DepositEnvelope),
        (status = 400, description = "Unknown status", body = ErrorSchema),
        (status = 403, description = "Staff only", body = ErrorSchema),
        (status = 404, description = "Deposit not found", body = ErrorSchema),
        (status = 409, description = "Illegal transition", body = ErrorSchema)
    ),
    tags = ["deposits"],
    operation_id = "updateDeposit"
)]
#[put("/deposit/{id}")]
pub async fn update_deposit(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
    payload: web::Json<UpdateDepositRequest>,
) -> ApiResult<HttpResponse> {
    let caller_id = caller.require()?;
    let id = parse_deposit_id(path.into_inner())?;
    let next = parse_status(&payload.status)?;
    let deposit = state.deposits.update_status(caller_id, id, next).await?;
    Ok(HttpResponse::Ok().json(DepositEnvelope::written(deposit)))
}

/// Cancel a deposit and release its vehicles.
#[utoipa::path(
    delete,
    path = "/api/v1/deposit/{id}",
    params(
        ("id" = i64, Path, description = "Deposit id"),
        ("X-User-Id" = i64, Header, description = "Authenticated caller")
    ),
    responses(
        (status = 200, description = "Cancelled deposit", body = DepositEnvelope),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Deposit not found", body = ErrorSchema),
        (status = 409, description = "Deposit already closed", body = ErrorSchema)
    ),
    tags = ["deposits"],
    operation_id = "cancelDeposit"
)]
#[delete("/deposit/{id}")]
pub async fn cancel_deposit(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let caller_id = caller.require()?;
    let id = parse_deposit_id(path.into_inner())?;
    let deposit = state.deposits.cancel(caller_id, id).await?;
    Ok(HttpResponse::Ok()
        .json(DepositEnvelope::written(deposit).with_message(format!("deposit {id} cancelled"))))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::{Method, StatusCode};
    use actix_web::{App, test, web};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{MockDepositCommand, MockDepositQuery};
    use crate::domain::{Deposit, DepositDetail, PickupSchedule, UserId, VehicleId};
    use crate::inbound::http::identity::USER_ID_HEADER;
    use crate::inbound::http::state::HttpStatePorts;

    fn deposit(status: DepositStatus) -> Deposit {
        Deposit {
            id: DepositId::new(5).expect("valid id"),
            customer_id: UserId::new(3).expect("valid id"),
            vehicle_id: Some(VehicleId::new(11).expect("valid id")),
            amount: 300_000_000,
            status,
            created_at: Utc::now(),
        }
    }

    async fn call(
        ports: HttpStatePorts,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::new(ports)))
                .service(
                    web::scope("/api/v1")
                        .service(create_deposit)
                        .service(list_deposits)
                        .service(get_deposit)
                        .service(update_deposit)
                        .service(cancel_deposit),
                ),
        )
        .await;
        let mut request = test::TestRequest::default()
            .method(method)
            .uri(uri)
            .insert_header((USER_ID_HEADER, "3"));
        if let Some(json) = body {
            request = request.set_json(json);
        }
        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body: Value = test::read_body_json(response).await;
        (status, body)
    }

    #[actix_web::test]
    async fn detail_includes_nested_pickups() {
        let mut query = MockDepositQuery::new();
        query.expect_detail().times(1).returning(|_, id| {
            let deposit = deposit(DepositStatus::PendingConfirmation);
            Ok(DepositDetail {
                pickups: vec![PickupSchedule {
                    deposit_id: id,
                    vehicle_id: VehicleId::new(11).expect("valid id"),
                    customer_id: deposit.customer_id,
                    pickup_at: None,
                    location: Some("Showroom".to_owned()),
                }],
                deposit,
                vehicle: None,
                customer: None,
                line_items: Vec::new(),
            })
        });
        let ports = HttpStatePorts {
            deposits_query: Arc::new(query),
            ..HttpStatePorts::default()
        };

        let (status, body) = call(ports, Method::GET, "/api/v1/deposit/5", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("id"), Some(&json!(5)));
        assert_eq!(body.get("statusLabel"), Some(&json!("Chờ xác nhận")));
        assert_eq!(body.pointer("/pickups/0/unscheduled"), Some(&json!(true)));
    }

    #[rstest]
    #[case("confirmed", DepositStatus::Confirmed)]
    #[case("Đã xác nhận", DepositStatus::Confirmed)]
    #[case("Hoàn thành", DepositStatus::Completed)]
    #[actix_web::test]
    async fn update_accepts_wire_values_and_labels(
        #[case] raw: &'static str,
        #[case] expected: DepositStatus,
    ) {
        let mut command = MockDepositCommand::new();
        command
            .expect_update_status()
            .withf(move |caller, id, next| caller.get() == 3 && id.get() == 5 && *next == expected)
            .times(1)
            .returning(|_, _, next| Ok(deposit(next)));
        let ports = HttpStatePorts {
            deposits: Arc::new(command),
            ..HttpStatePorts::default()
        };

        let (status, body) = call(
            ports,
            Method::PUT,
            "/api/v1/deposit/5",
            Some(json!({ "TrangThaiDat": raw })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.pointer("/data/status"), Some(&json!(expected.as_str())));
    }

    #[actix_web::test]
    async fn update_rejects_unknown_status() {
        let mut command = MockDepositCommand::new();
        command.expect_update_status().never();
        let ports = HttpStatePorts {
            deposits: Arc::new(command),
            ..HttpStatePorts::default()
        };

        let (status, body) = call(
            ports,
            Method::PUT,
            "/api/v1/deposit/5",
            Some(json!({ "TrangThaiDat": "shipped" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/details/field"), Some(&json!("status")));
    }

    #[actix_web::test]
    async fn cancel_returns_the_removed_deposit() {
        let mut command = MockDepositCommand::new();
        command
            .expect_cancel()
            .times(1)
            .returning(|_, _| Ok(deposit(DepositStatus::Cancelled)));
        let ports = HttpStatePorts {
            deposits: Arc::new(command),
            ..HttpStatePorts::default()
        };

        let (status, body) = call(ports, Method::DELETE, "/api/v1/deposit/5", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("message"), Some(&json!("deposit 5 cancelled")));
        assert_eq!(body.pointer("/data/status"), Some(&json!("cancelled")));
    }

    #[actix_web::test]
    async fn cancel_of_missing_deposit_is_not_found() {
        let (status, body) = call(
            HttpStatePorts::default(),
            Method::DELETE,
            "/api/v1/deposit/404",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.get("code"), Some(&json!("not_found")));
    }

    #[actix_web::test]
    async fn list_forwards_the_status_filter() {
        let mut query = MockDepositQuery::new();
        query
            .expect_list()
            .withf(|_, status| *status == Some(DepositStatus::Confirmed))
            .times(1)
            .returning(|_, _| Ok(vec![deposit(DepositStatus::Confirmed)]));
        let ports = HttpStatePorts {
            deposits_query: Arc::new(query),
            ..HttpStatePorts::default()
        };

        let (status, body) =
            call(ports, Method::GET, "/api/v1/deposits?status=confirmed", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn create_places_a_cash_deposit() {
        let mut command = MockDepositCommand::new();
        command
            .expect_place()
            .withf(|request| {
                request.method == PaymentMethod::Cash
                    && request.percentage.get() == 30
                    && request.pickup.is_some()
            })
            .times(1)
            .returning(|_| {
                Ok(crate::domain::ports::DepositPlacement::Created(deposit(
                    DepositStatus::PendingConfirmation,
                )))
            });
        let ports = HttpStatePorts {
            deposits: Arc::new(command),
            ..HttpStatePorts::default()
        };

        let (status, body) = call(
            ports,
            Method::POST,
            "/api/v1/deposits",
            Some(json!({
                "vehicles": [{ "idXe": 11, "SoLuong": 1 }],
                "depositPercentage": 30,
                "pickupAt": "2026-11-02T09:00:00Z",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.get("replayed"), Some(&json!(false)));
    }
}
