//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! Every scheduling repository holds a clone of [`DbPool`] and checks out one
//! connection per port call. Checkout and build failures surface as
//! [`PoolError`], which the repositories map onto their port's `Connection`
//! variant.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

const DEFAULT_MAX_SIZE: u32 = 8;
const DEFAULT_MIN_IDLE: u32 = 1;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(15);

/// Pool failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available within the checkout timeout.
    #[error("database connection checkout failed: {message}")]
    Checkout { message: String },
    /// The pool could not be constructed.
    #[error("database pool construction failed: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Connection pool settings.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use carerota::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://localhost/rota")
///     .with_max_size(4)
///     .with_checkout_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Defaults: eight connections, one kept idle, fifteen second checkout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: Some(DEFAULT_MIN_IDLE),
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the number of open connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Shared async connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool, opening `min_idle` connections eagerly.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the URL is invalid or the server refuses.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] when the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn new_config_uses_small_pool_defaults() {
        let config = PoolConfig::new("postgres://localhost/rota");

        assert_eq!(config.database_url(), "postgres://localhost/rota");
        assert_eq!(config.max_size(), DEFAULT_MAX_SIZE);
        assert_eq!(config.min_idle, Some(DEFAULT_MIN_IDLE));
        assert_eq!(config.checkout_timeout, DEFAULT_CHECKOUT_TIMEOUT);
    }

    #[rstest]
    fn builders_override_each_setting() {
        let config = PoolConfig::new("postgres://localhost/rota")
            .with_max_size(2)
            .with_min_idle(None)
            .with_checkout_timeout(Duration::from_millis(250));

        assert_eq!(config.max_size(), 2);
        assert_eq!(config.min_idle, None);
        assert_eq!(config.checkout_timeout, Duration::from_millis(250));
    }

    #[rstest]
    #[case(PoolError::checkout("timed out"), "checkout failed: timed out")]
    #[case(PoolError::build("bad url"), "construction failed: bad url")]
    fn errors_render_their_cause(#[case] error: PoolError, #[case] expected: &str) {
        assert!(error.to_string().ends_with(expected));
    }
}
