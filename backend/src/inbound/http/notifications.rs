//! The caller's in-app notifications.
//!
//! ```text
//! GET /api/v1/notifications
//! PUT /api/v1/notifications/{id}/read
//! ```

use actix_web::{HttpResponse, get, put, web};

use crate::domain::ports::NotificationRepositoryError;
use crate::domain::{Error, NotificationId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::dto::NotificationDto;
use crate::inbound::http::identity::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

fn map_store_error(err: NotificationRepositoryError) -> Error {
    match err {
        NotificationRepositoryError::Connection { message } => Error::service_unavailable(message),
        NotificationRepositoryError::Query { message } => Error::internal(message),
    }
}

/// List the caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(("X-User-Id" = i64, Header, description = "Authenticated caller")),
    responses(
        (
            status = 200,
            description = "Notifications",
            headers(("Cache-Control" = String, description = "Cache control header")),
            body = [NotificationDto]
        ),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    caller: Caller,
) -> ApiResult<HttpResponse> {
    let user_id = caller.require()?;
    let notifications = state
        .notifications
        .list_for_user(user_id)
        .await
        .map_err(map_store_error)?;
    let body: Vec<NotificationDto> = notifications.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(body))
}

/// Mark one of the caller's notifications as read.
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    params(
        ("id" = i64, Path, description = "Notification id"),
        ("X-User-Id" = i64, Header, description = "Authenticated caller")
    ),
    responses(
        (status = 204, description = "Marked read"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Notification not found", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[put("/notifications/{id}/read")]
pub async fn mark_notification_read(
    state: web::Data<HttpState>,
    caller: Caller,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user_id = caller.require()?;
    let id = NotificationId::new(path.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let updated = state
        .notifications
        .mark_read(user_id, id)
        .await
        .map_err(map_store_error)?;
    if !updated {
        return Err(Error::not_found(format!("notification {id} not found")));
    }
    Ok(HttpResponse::NoContent().finish())
}
