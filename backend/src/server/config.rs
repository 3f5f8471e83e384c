//! Application settings loaded via OrthoConfig, and the server config built
//! from them.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use showroom::domain::{CeilingPolicy, DepositSettings, GatewayPricing, PickupPolicy};
use showroom::outbound::persistence::{DbPool, PoolConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_CURRENCY: &str = "usd";
const DEFAULT_CONVERSION_RATE: u32 = 25_000;
const DEFAULT_GATEWAY_MAX_AMOUNT: i64 = 99_999_999;
const DEFAULT_PICKUP_LOCATION: &str = "Showroom";
const DEFAULT_EMAIL_FROM: &str = "Showroom <no-reply@showroom.invalid>";

/// A setting held a value outside its allowed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}: expected {expected}")]
pub struct SettingsError {
    key: &'static str,
    value: String,
    expected: &'static str,
}

impl SettingsError {
    fn new(key: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            key,
            value: value.to_owned(),
            expected,
        }
    }
}

/// Process settings, read from `SHOWROOM_*` variables, CLI flags and config
/// files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SHOWROOM")]
pub struct AppSettings {
    /// PostgreSQL URL. Without it the server runs on fixture ports.
    pub database_url: Option<String>,
    /// Listen address.
    pub bind_addr: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub db_checkout_timeout_secs: Option<u64>,
    /// Apply embedded migrations at startup.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Stripe secret key. Without it card quotes are unavailable.
    pub stripe_secret_key: Option<String>,
    /// Stripe API base URL.
    pub stripe_api_base: Option<String>,
    /// Settlement currency code.
    pub gateway_currency: Option<String>,
    /// Catalogue units per settlement major unit.
    pub conversion_rate: Option<u32>,
    /// Gateway ceiling in smallest settlement units.
    pub gateway_max_amount: Option<i64>,
    /// `reject` or `cap`.
    pub ceiling_policy: Option<String>,
    /// `unscheduled` or `randomized`.
    pub pickup_policy: Option<String>,
    /// Location used when the customer proposes none.
    pub pickup_location: Option<String>,
    /// Notify every customer about updates and cancellations.
    #[ortho_config(default = false)]
    pub broadcast_to_customers: bool,
    /// Email provider endpoint.
    pub email_api_url: Option<String>,
    /// Email provider API key.
    pub email_api_key: Option<String>,
    /// Sender address.
    pub email_from: Option<String>,
}

impl AppSettings {
    /// Listen address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        SocketAddr::from_str(raw)
            .map_err(|_| SettingsError::new("bind_addr", raw, "a socket address such as 0.0.0.0:8080"))
    }

    /// Pool settings, or `None` when no database is configured.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        let Some(url) = self.database_url.as_deref() else {
            return Ok(None);
        };
        let mut config = PoolConfig::new(url);
        if let Some(max) = self.db_max_connections {
            if max == 0 {
                return Err(SettingsError::new("db_max_connections", "0", "a positive integer"));
            }
            config.max_connections = max;
        }
        if let Some(secs) = self.db_checkout_timeout_secs {
            config.checkout_timeout = Duration::from_secs(secs);
        }
        Ok(Some(config))
    }

    /// Stripe base URL.
    pub fn stripe_api_base(&self) -> &str {
        self.stripe_api_base
            .as_deref()
            .unwrap_or(DEFAULT_STRIPE_API_BASE)
    }

    /// Sender address for outgoing email.
    pub fn email_from(&self) -> &str {
        self.email_from.as_deref().unwrap_or(DEFAULT_EMAIL_FROM)
    }

    /// Currency, conversion and ceiling for gateway charges.
    pub fn gateway_pricing(&self) -> Result<GatewayPricing, SettingsError> {
        let ceiling_policy = match self.ceiling_policy.as_deref() {
            None | Some("reject") => CeilingPolicy::Reject,
            Some("cap") => CeilingPolicy::Cap,
            Some(other) => return Err(SettingsError::new("ceiling_policy", other, "reject or cap")),
        };
        let conversion_rate = self.conversion_rate.unwrap_or(DEFAULT_CONVERSION_RATE);
        if conversion_rate == 0 {
            return Err(SettingsError::new("conversion_rate", "0", "a positive integer"));
        }
        let max_amount = self
            .gateway_max_amount
            .unwrap_or(DEFAULT_GATEWAY_MAX_AMOUNT);
        if max_amount <= 0 {
            return Err(SettingsError::new(
                "gateway_max_amount",
                &max_amount.to_string(),
                "a positive integer",
            ));
        }
        Ok(GatewayPricing {
            currency: self
                .gateway_currency
                .as_deref()
                .unwrap_or(DEFAULT_CURRENCY)
                .to_ascii_lowercase(),
            conversion_rate: Decimal::from(conversion_rate),
            max_amount,
            ceiling_policy,
        })
    }

    /// Pickup defaults for new deposits.
    pub fn deposit_settings(&self) -> Result<DepositSettings, SettingsError> {
        let pickup_policy = match self.pickup_policy.as_deref() {
            None | Some("unscheduled") => PickupPolicy::Unscheduled,
            Some("randomized") => PickupPolicy::Randomized,
            Some(other) => {
                return Err(SettingsError::new(
                    "pickup_policy",
                    other,
                    "unscheduled or randomized",
                ));
            }
        };
        Ok(DepositSettings {
            pickup_policy,
            pickup_location: self
                .pickup_location
                .clone()
                .unwrap_or_else(|| DEFAULT_PICKUP_LOCATION.to_owned()),
        })
    }
}

/// Everything the server needs once settings are validated.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) settings: AppSettings,
}

impl ServerConfig {
    /// Construct a server configuration from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the bind address does not parse.
    pub fn new(settings: AppSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr()?,
            db_pool: None,
            settings,
        })
    }

    /// Attach a database pool; repositories switch from fixtures to Diesel.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 10] = [
        "SHOWROOM_DATABASE_URL",
        "SHOWROOM_DB_MAX_CONNECTIONS",
        "SHOWROOM_DB_CHECKOUT_TIMEOUT_SECS",
        "SHOWROOM_BIND_ADDR",
        "SHOWROOM_RUN_MIGRATIONS",
        "SHOWROOM_CEILING_POLICY",
        "SHOWROOM_PICKUP_POLICY",
        "SHOWROOM_CONVERSION_RATE",
        "SHOWROOM_BROADCAST_TO_CUSTOMERS",
        "SHOWROOM_STRIPE_SECRET_KEY",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("showroom")]).expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        KEYS.iter().map(|key| (*key, None)).collect()
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();

        assert!(settings.database_url.is_none());
        assert_eq!(settings.pool_config().expect("no database"), None);
        assert!(settings.run_migrations);
        assert!(!settings.broadcast_to_customers);
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            SocketAddr::from(([0, 0, 0, 0], 8080))
        );
        assert_eq!(settings.gateway_pricing().expect("defaults"), GatewayPricing::default());
        assert_eq!(settings.deposit_settings().expect("defaults"), DepositSettings::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.extend([
            ("SHOWROOM_DATABASE_URL", Some("postgres://db/showroom".to_owned())),
            ("SHOWROOM_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("SHOWROOM_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("SHOWROOM_RUN_MIGRATIONS", Some("false".to_owned())),
            ("SHOWROOM_CEILING_POLICY", Some("cap".to_owned())),
            ("SHOWROOM_PICKUP_POLICY", Some("randomized".to_owned())),
            ("SHOWROOM_CONVERSION_RATE", Some("24000".to_owned())),
            ("SHOWROOM_BROADCAST_TO_CUSTOMERS", Some("true".to_owned())),
        ]);
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();

        let pool = settings
            .pool_config()
            .expect("valid pool")
            .expect("database configured");
        assert_eq!(pool.database_url, "postgres://db/showroom");
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.checkout_timeout, PoolConfig::DEFAULT_CHECKOUT_TIMEOUT);
        assert!(!settings.run_migrations);
        assert!(settings.broadcast_to_customers);
        assert_eq!(
            settings.bind_addr().expect("parses"),
            SocketAddr::from(([127, 0, 0, 1], 9000))
        );
        let pricing = settings.gateway_pricing().expect("valid pricing");
        assert_eq!(pricing.ceiling_policy, CeilingPolicy::Cap);
        assert_eq!(pricing.conversion_rate, Decimal::from(24_000));
        assert_eq!(
            settings.deposit_settings().expect("valid").pickup_policy,
            PickupPolicy::Randomized
        );
    }

    #[rstest]
    #[case("SHOWROOM_CEILING_POLICY", "split")]
    #[case("SHOWROOM_PICKUP_POLICY", "tomorrow")]
    fn unknown_policies_are_rejected(#[case] key: &'static str, #[case] value: &str) {
        let mut vars = cleared();
        vars.push((key, Some(value.to_owned())));
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();

        let failed = settings.gateway_pricing().is_err() || settings.deposit_settings().is_err();
        assert!(failed, "{key}={value} should be rejected");
    }

    #[rstest]
    fn empty_pools_are_rejected() {
        let mut vars = cleared();
        vars.extend([
            ("SHOWROOM_DATABASE_URL", Some("postgres://db/showroom".to_owned())),
            ("SHOWROOM_DB_MAX_CONNECTIONS", Some("0".to_owned())),
        ]);
        let _guard = lock_env(vars);

        assert!(load_from_empty_args().pool_config().is_err());
    }

    #[rstest]
    fn server_config_rejects_bad_bind_addresses() {
        let mut vars = cleared();
        vars.push(("SHOWROOM_BIND_ADDR", Some("localhost".to_owned())));
        let _guard = lock_env(vars);

        let err = ServerConfig::new(load_from_empty_args())
            .err()
            .expect("bind address must fail");

        assert!(err.to_string().contains("bind_addr"));
    }
}
