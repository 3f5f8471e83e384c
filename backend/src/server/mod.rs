//! HTTP server assembly for the showroom binary.

mod config;
mod state_builders;

pub use config::{AppSettings, ServerConfig};

use actix_web::dev::Server;
use actix_web::{App, HttpResponse, HttpServer, web};

use showroom::Trace;
use showroom::domain::Error;
use showroom::inbound::http::configure_api;
use showroom::inbound::http::health::{HealthState, live, ready};
#[cfg(debug_assertions)]
use showroom::ApiDoc;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Seconds in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE_SECS: u64 = 20;

async fn unknown_route() -> Result<HttpResponse, Error> {
    Err(Error::not_found("no such endpoint"))
}

/// Bind the listener for `config` and return the running server.
///
/// `health_state` flips to ready once the socket is bound; awaiting the
/// returned [`Server`] drives it until shutdown.
///
/// # Errors
/// Invalid policies, unusable adapter settings or a failed bind.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = state_builders::build_http_state(&config)?;
    let health = health_state.clone();

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(health.clone())
            .app_data(http_state.clone())
            .wrap(Trace)
            .configure(configure_api)
            .service(ready)
            .service(live);
        #[cfg(debug_assertions)]
        let app = app.service(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
        app.default_service(web::to(unknown_route))
    })
    .shutdown_timeout(SHUTDOWN_GRACE_SECS)
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
