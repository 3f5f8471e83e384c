//! Showroom entry-point: loads settings, prepares the database and serves
//! the REST API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{AppSettings, ServerConfig, create_server};
use showroom::inbound::http::health::HealthState;
use showroom::outbound::persistence::{DbPool, run_pending_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))?;
    let pool_config = settings.pool_config().map_err(std::io::Error::other)?;
    let run_migrations = settings.run_migrations;
    let mut config = ServerConfig::new(settings).map_err(std::io::Error::other)?;

    if let Some(pool_config) = pool_config {
        if run_migrations {
            run_pending_migrations(&pool_config.database_url)
                .await
                .map_err(std::io::Error::other)?;
        }
        let pool = DbPool::new(pool_config)
            .await
            .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    info!(bind_addr = %config.bind_addr, "starting showroom server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
