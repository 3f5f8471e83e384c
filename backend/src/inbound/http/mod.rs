//! HTTP inbound adapter exposing the REST endpoints.

pub mod cache_control;
pub mod deposits;
pub mod dto;
pub mod error;
pub mod health;
pub mod identity;
pub mod notifications;
pub mod payment;
pub mod schemas;
pub mod state;
pub mod vehicles;

use actix_web::web;

use crate::domain::Error;

pub use error::ApiResult;

fn rejected_input(field: &'static str, err: impl std::fmt::Display) -> actix_web::Error {
    Error::invalid_request(err.to_string())
        .with_details(serde_json::json!({ "field": field }))
        .into()
}

/// Register every `/api/v1` handler on `cfg`.
///
/// The caller supplies [`state::HttpState`] as app data. Extractor failures
/// answer with the usual error body instead of actix's plain text.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(|err, _| rejected_input("body", err)))
            .app_data(web::QueryConfig::default().error_handler(|err, _| rejected_input("query", err)))
            .app_data(web::PathConfig::default().error_handler(|err, _| rejected_input("path", err)))
            .service(payment::submit_payment)
            .service(deposits::create_deposit)
            .service(deposits::list_deposits)
            .service(deposits::get_deposit)
            .service(deposits::update_deposit)
            .service(deposits::cancel_deposit)
            .service(vehicles::list_vehicles)
            .service(vehicles::get_vehicle)
            .service(notifications::list_notifications)
            .service(notifications::mark_notification_read),
    );
}
