//! bb8 pool of `AsyncPgConnection`s shared by the Diesel repositories.
//!
//! A checkout that times out becomes [`PoolError::Checkout`]; repositories
//! report it as a connection failure and the HTTP layer answers 503.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::debug;

/// Connection checked out of a [`DbPool`].
pub type PooledPg<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Pool failure; the payload is the bb8 or driver message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became free before the checkout timeout.
    #[error("database connection unavailable: {0}")]
    Checkout(String),
    /// The pool could not open its initial connections.
    #[error("database pool could not start: {0}")]
    Build(String),
}

impl PoolError {
    /// Underlying bb8 or driver message.
    pub fn into_message(self) -> String {
        match self {
            Self::Checkout(message) | Self::Build(message) => message,
        }
    }
}

/// Where to connect and how many connections to hold.
///
/// ```
/// use std::time::Duration;
///
/// use showroom::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig {
///     max_connections: 4,
///     ..PoolConfig::new("postgres://showroom@localhost/showroom")
/// };
/// assert_eq!(config.checkout_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Postgres connection URL.
    pub database_url: String,
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// How long a checkout waits before failing.
    pub checkout_timeout: Duration,
}

impl PoolConfig {
    /// Pool size when none is configured.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    /// Checkout wait when none is configured.
    pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Defaults for everything but the URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            checkout_timeout: Self::DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Idle connections kept warm: a fifth of the pool, at least one.
    fn min_idle(&self) -> u32 {
        self.max_connections.div_euclid(5).max(1)
    }
}

/// Cloneable pool handle.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and open the idle connections.
    ///
    /// # Errors
    /// [`PoolError::Build`] when the URL is invalid or the server refuses
    /// the initial connections.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_idle()))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::Build(err.to_string()))?;
        debug!(max_connections = config.max_connections, "database pool ready");
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// [`PoolError::Checkout`] once the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledPg<'_>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::Checkout(err.to_string()))
    }
}
