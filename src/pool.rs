//! # Connection Pooling Module
//!
//! Bounded pooling of MySQL connections using bb8. Connections are opened
//! lazily on checkout (unless `min_idle` asks for warm ones) with a single
//! attempt each. bb8 only hands connect errors to its error sink, so the
//! manager publishes them and a waiting checkout returns the classified
//! error instead of waiting out the checkout timeout. Connections are pinged before
//! being handed out when `test_on_check_out` is set, and returned to the pool
//! when the [`PooledConnection`] guard drops.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dbconn::{ConnectionConfig, ConnectionPool, PoolConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::from_env()?;
//! let pool = ConnectionPool::new(&config, &PoolConfig::default()).await?;
//! let conn = pool.get().await?;
//! # drop(conn);
//! # Ok(())
//! # }
//! ```

use crate::config::{ConnectionConfig, PoolConfig};
use crate::error::{ConnectionError, ProviderError};
use crate::provider::classify;
use bb8::{ManageConnection, Pool, RunError};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const FAILURE_CHANNEL_CAPACITY: usize = 16;

/// bb8 connection manager for `mysql_async`
///
/// Failed connects are published, classified, to the owning pool's waiting
/// checkouts.
#[derive(Debug, Clone)]
pub struct MysqlConnectionManager {
    opts: Opts,
    config: ConnectionConfig,
    failures: broadcast::Sender<ConnectionError>,
}

impl MysqlConnectionManager {
    /// Create a manager that opens connections to the configured target
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            opts: config.driver_opts(),
            config: config.clone(),
            failures,
        }
    }
}

impl ManageConnection for MysqlConnectionManager {
    type Connection = Conn;
    type Error = mysql_async::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        match Conn::new(self.opts.clone()).await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                // no subscribers just means nobody is waiting on a checkout
                let _ = self.failures.send(classify(&e, &self.config));
                Err(e)
            }
        }
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.ping().await
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        // broken sockets surface through the ping in `is_valid`
        false
    }
}

/// A connection checked out of a [`ConnectionPool`]
pub type PooledConnection<'a> = bb8::PooledConnection<'a, MysqlConnectionManager>;

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStatistics {
    /// Connections currently managed by the pool
    pub connections: u32,
    /// Connections sitting idle
    pub idle_connections: u32,
    /// Connections checked out by callers
    pub active_connections: u32,
    /// Configured upper bound
    pub max_size: u32,
    /// Checked-out share of `max_size`, 0-100
    pub utilization_percent: f32,
}

impl PoolStatistics {
    /// Derive statistics from raw counts
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(connections: u32, idle_connections: u32, max_size: u32) -> Self {
        let active_connections = connections.saturating_sub(idle_connections);
        let utilization_percent = if max_size == 0 {
            0.0
        } else {
            active_connections as f32 / max_size as f32 * 100.0
        };
        Self {
            connections,
            idle_connections,
            active_connections,
            max_size,
            utilization_percent,
        }
    }
}

/// Pool of connections to one database target
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Pool<MysqlConnectionManager>,
    failures: broadcast::Sender<ConnectionError>,
    config: ConnectionConfig,
    max_size: u32,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("address", &self.config.address())
            .field("database", &self.config.database)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

impl ConnectionPool {
    /// Create a new connection pool
    ///
    /// Does not connect unless `pool_config.min_idle` is set, in which case
    /// the idle connections are opened before returning.
    pub async fn new(
        config: &ConnectionConfig,
        pool_config: &PoolConfig,
    ) -> Result<Self, ProviderError> {
        pool_config.validate()?;

        info!("Creating connection pool for database: {}", config.database);
        debug!(
            "Building connection pool with max_size={}, min_idle={:?}",
            pool_config.max_size, pool_config.min_idle
        );

        let manager = MysqlConnectionManager::new(config);
        let failures = manager.failures.clone();
        let pool = Pool::builder()
            .max_size(pool_config.max_size)
            .min_idle(pool_config.min_idle)
            .connection_timeout(pool_config.connection_timeout())
            .idle_timeout(pool_config.idle_timeout())
            .test_on_check_out(pool_config.test_on_check_out)
            // one driver connect per attempt; failures surface to the caller
            .retry_connection(false)
            .build(manager)
            .await
            .map_err(|e| {
                error!("Failed to build connection pool: {}", e);
                classify(&e, config)
            })?;

        info!("Successfully created connection pool for database: {}", config.database);
        Ok(Self {
            pool,
            failures,
            config: config.clone(),
            max_size: pool_config.max_size,
        })
    }

    /// Check out a connection
    ///
    /// A connect failure while waiting ends the checkout with that error;
    /// otherwise waiting is bounded by the pool's connection timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_>, ConnectionError> {
        // subscribe first so the connect this checkout triggers is seen
        let mut failures = self.failures.subscribe();
        tokio::select! {
            result = self.pool.get() => result.map_err(|e| self.checkout_error(e)),
            Ok(e) = failures.recv() => {
                warn!(address = %self.config.address(), error = %e, "Pooled connect failed");
                Err(e)
            }
        }
    }

    fn checkout_error(&self, err: RunError<mysql_async::Error>) -> ConnectionError {
        match err {
            RunError::User(e) => classify(&e, &self.config),
            RunError::TimedOut => {
                warn!(
                    address = %self.config.address(),
                    "Timed out waiting for a pooled connection"
                );
                ConnectionError::Timeout {
                    operation: "pool checkout".to_string(),
                }
            }
        }
    }

    /// Check out a connection and ping it
    pub async fn verify_liveness(&self) -> bool {
        match self.get().await {
            Ok(mut conn) => match conn.ping().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Pooled connection failed liveness probe");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not check out a connection for liveness probe");
                false
            }
        }
    }

    /// Current occupancy
    #[must_use]
    pub fn statistics(&self) -> PoolStatistics {
        let state = self.pool.state();
        PoolStatistics::from_counts(state.connections, state.idle_connections, self.max_size)
    }

    /// The configuration pooled connections are opened with
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}
