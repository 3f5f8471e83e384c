//! Builders wiring repositories, adapters and services into HTTP state.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::DefaultClock;
use reqwest::Url;
use tracing::{info, warn};

use showroom::domain::ports::{
    DepositRepository, DisabledPaymentGateway, EmailSender, FixtureDepositRepository,
    FixtureNotificationRepository, FixtureUserDirectory, FixtureVehicleRepository,
    NotificationRepository, PaymentGateway, UserDirectory, VehicleRepository,
};
use showroom::domain::{
    DepositService, DepositServicePorts, NotificationFanout, PaymentService,
    PaymentServicePorts, RecipientPolicy,
};
use showroom::inbound::http::state::{HttpState, HttpStatePorts};
use showroom::outbound::email::{HttpEmailSender, LoggingEmailSender};
use showroom::outbound::persistence::{
    DbPool, DieselDepositRepository, DieselNotificationRepository, DieselUserDirectory,
    DieselVehicleRepository,
};
use showroom::outbound::stripe::StripeHttpGateway;

use super::config::{AppSettings, ServerConfig};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(15);

/// Persistence ports shared by every service.
#[derive(Clone)]
pub(super) struct Repositories {
    pub(super) deposits: Arc<dyn DepositRepository>,
    pub(super) vehicles: Arc<dyn VehicleRepository>,
    pub(super) users: Arc<dyn UserDirectory>,
    pub(super) notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    fn fixtures() -> Self {
        Self {
            deposits: Arc::new(FixtureDepositRepository),
            vehicles: Arc::new(FixtureVehicleRepository),
            users: Arc::new(FixtureUserDirectory),
            notifications: Arc::new(FixtureNotificationRepository),
        }
    }

    fn diesel(pool: &DbPool) -> Self {
        Self {
            deposits: Arc::new(DieselDepositRepository::new(pool.clone())),
            vehicles: Arc::new(DieselVehicleRepository::new(pool.clone())),
            users: Arc::new(DieselUserDirectory::new(pool.clone())),
            notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
        }
    }
}

/// Outbound collaborators outside the database.
pub(super) struct Collaborators {
    pub(super) gateway: Arc<dyn PaymentGateway>,
    pub(super) email: Arc<dyn EmailSender>,
}

fn build_repositories(pool: Option<&DbPool>) -> Repositories {
    match pool {
        Some(pool) => Repositories::diesel(pool),
        None => {
            warn!("no database configured; serving fixture data");
            Repositories::fixtures()
        }
    }
}

fn parse_url(key: &str, raw: &str) -> std::io::Result<Url> {
    Url::parse(raw).map_err(|err| std::io::Error::other(format!("invalid {key} {raw:?}: {err}")))
}

fn build_gateway(settings: &AppSettings) -> std::io::Result<Arc<dyn PaymentGateway>> {
    let Some(secret_key) = settings.stripe_secret_key.as_deref() else {
        warn!("stripe_secret_key not set; card payments disabled");
        return Ok(Arc::new(DisabledPaymentGateway));
    };
    let base = parse_url("stripe_api_base", settings.stripe_api_base())?;
    let gateway =
        StripeHttpGateway::new(base, secret_key, OUTBOUND_TIMEOUT).map_err(std::io::Error::other)?;
    Ok(Arc::new(gateway))
}

fn build_email(settings: &AppSettings) -> std::io::Result<Arc<dyn EmailSender>> {
    match (
        settings.email_api_url.as_deref(),
        settings.email_api_key.as_deref(),
    ) {
        (Some(url), Some(key)) => {
            let endpoint = parse_url("email_api_url", url)?;
            let sender = HttpEmailSender::new(endpoint, key, settings.email_from(), OUTBOUND_TIMEOUT)
                .map_err(std::io::Error::other)?;
            Ok(Arc::new(sender))
        }
        (None, None) => {
            info!("email provider not configured; emails are logged only");
            Ok(Arc::new(LoggingEmailSender))
        }
        _ => Err(std::io::Error::other(
            "email_api_url and email_api_key must be set together",
        )),
    }
}

/// Assemble the services over the given ports.
pub(super) fn build_http_state_with(
    repositories: Repositories,
    collaborators: Collaborators,
    settings: &AppSettings,
) -> std::io::Result<HttpState> {
    let pricing = settings.gateway_pricing().map_err(std::io::Error::other)?;
    let deposit_settings = settings.deposit_settings().map_err(std::io::Error::other)?;

    let fanout = NotificationFanout::new(
        repositories.notifications.clone(),
        repositories.users.clone(),
        collaborators.email,
        RecipientPolicy {
            broadcast_to_customers: settings.broadcast_to_customers,
        },
    );
    let deposits = Arc::new(DepositService::new(
        DepositServicePorts {
            deposits: repositories.deposits,
            vehicles: repositories.vehicles.clone(),
            users: repositories.users.clone(),
        },
        fanout,
        Arc::new(DefaultClock),
        deposit_settings,
    ));
    let payments = Arc::new(PaymentService::new(
        PaymentServicePorts {
            gateway: collaborators.gateway,
            vehicles: repositories.vehicles.clone(),
            users: repositories.users,
            deposits: deposits.clone(),
        },
        pricing,
    ));

    Ok(HttpState::new(HttpStatePorts {
        payments,
        deposits: deposits.clone(),
        deposits_query: deposits,
        vehicles: repositories.vehicles,
        notifications: repositories.notifications,
    }))
}

/// Build the shared HTTP state from the server configuration.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let repositories = build_repositories(config.db_pool.as_ref());
    let collaborators = Collaborators {
        gateway: build_gateway(&config.settings)?,
        email: build_email(&config.settings)?,
    };
    build_http_state_with(repositories, collaborators, &config.settings).map(web::Data::new)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;
    use env_lock::lock_env;
    use ortho_config::OrthoConfig;
    use rstest::rstest;
    use showroom::domain::ports::PaymentGatewayError;
    use showroom::domain::{GatewayIntentId, VehicleStatus};

    fn settings(vars: Vec<(&'static str, Option<String>)>) -> AppSettings {
        let mut all: Vec<(&'static str, Option<String>)> = [
            "SHOWROOM_STRIPE_SECRET_KEY",
            "SHOWROOM_EMAIL_API_URL",
            "SHOWROOM_EMAIL_API_KEY",
            "SHOWROOM_CEILING_POLICY",
        ]
        .into_iter()
        .map(|key| (key, None))
        .collect();
        all.extend(vars);
        let _guard = lock_env(all);
        AppSettings::load_from_iter([OsString::from("showroom")]).expect("config should load")
    }

    #[rstest]
    #[tokio::test]
    async fn missing_secret_key_disables_card_payments() {
        let gateway = build_gateway(&settings(Vec::new())).expect("gateway builds");
        let id = GatewayIntentId::new("pi_1").expect("valid id");

        let err = gateway.retrieve_intent(&id).await.expect_err("disabled");

        assert!(matches!(err, PaymentGatewayError::Unavailable { .. }));
    }

    #[rstest]
    fn email_settings_must_come_in_pairs() {
        let only_url = settings(vec![(
            "SHOWROOM_EMAIL_API_URL",
            Some("https://mail.example.test/emails".to_owned()),
        )]);

        assert!(build_email(&only_url).is_err());
        assert!(build_email(&settings(Vec::new())).is_ok());
    }

    #[rstest]
    fn invalid_policies_stop_startup() {
        let bad = settings(vec![("SHOWROOM_CEILING_POLICY", Some("split".to_owned()))]);
        let collaborators = Collaborators {
            gateway: Arc::new(DisabledPaymentGateway),
            email: Arc::new(LoggingEmailSender),
        };

        assert!(build_http_state_with(Repositories::fixtures(), collaborators, &bad).is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_state_serves_an_empty_catalogue() {
        let collaborators = Collaborators {
            gateway: Arc::new(DisabledPaymentGateway),
            email: Arc::new(LoggingEmailSender),
        };
        let state =
            build_http_state_with(Repositories::fixtures(), collaborators, &settings(Vec::new()))
                .expect("state builds");

        let vehicles = state
            .vehicles
            .list(Some(VehicleStatus::Available))
            .await
            .expect("fixture list");

        assert!(vehicles.is_empty());
    }
}
