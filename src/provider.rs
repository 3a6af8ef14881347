//! Connection acquisition
//!
//! [`ConnectionProvider`] turns a resolved [`ConnectionConfig`] into an open
//! [`Connection`]. Each call to [`ConnectionProvider::acquire`] makes exactly
//! one connection attempt and never retries.

use crate::config::{ConnectionConfig, PoolConfig};
use crate::connection::Connection;
use crate::error::{ConfigError, ConnectionError, ProviderError};
use crate::pool::ConnectionPool;
use mysql_async::Conn;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;
const ER_BAD_DB: u16 = 1049;
const ER_ACCESS_DENIED_NO_PASSWORD: u16 = 1698;

/// Produces connections for one database target
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: ConnectionConfig,
    connect_timeout: Option<Duration>,
}

impl ConnectionProvider {
    /// Create a provider for an already-resolved configuration
    #[must_use]
    pub const fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connect_timeout: None,
        }
    }

    /// Resolve configuration from the environment and create a provider
    pub fn from_env() -> Result<Self, ConfigError> {
        ConnectionConfig::from_env().map(Self::new)
    }

    /// Bound how long [`acquire`](Self::acquire) may wait for the handshake
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// The configuration connections are opened with
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a new connection
    ///
    /// Blocks until the handshake and authentication complete or fail.
    /// Emits a connected/failed status event either way.
    pub async fn acquire(&self) -> Result<Connection, ConnectionError> {
        let address = self.config.address();
        debug!(
            "Opening connection: host={}:{}, user={}, database={}",
            self.config.host, self.config.port, self.config.user, self.config.database
        );

        let start = Instant::now();
        let attempt = Conn::new(self.config.driver_opts());
        let result = match self.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(inner) => inner.map_err(|e| classify(&e, &self.config)),
                Err(_) => Err(ConnectionError::Timeout {
                    operation: format!("connect to {address}"),
                }),
            },
            None => attempt.await.map_err(|e| classify(&e, &self.config)),
        };

        match result {
            Ok(conn) => {
                info!(
                    address = %address,
                    user = %self.config.user,
                    database = %self.config.database,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Connected to MySQL database"
                );
                Ok(Connection::open(conn, address, self.config.database.clone()))
            }
            Err(e) => {
                error!(
                    address = %address,
                    user = %self.config.user,
                    database = %self.config.database,
                    error = %e,
                    "Failed to connect to MySQL database"
                );
                Err(e)
            }
        }
    }

    /// Build a connection pool for the same target
    pub async fn pool(&self, pool_config: &PoolConfig) -> Result<ConnectionPool, ProviderError> {
        ConnectionPool::new(&self.config, pool_config).await
    }
}

/// Map a driver error onto the connection error kinds
pub(crate) fn classify(err: &mysql_async::Error, config: &ConnectionConfig) -> ConnectionError {
    match err {
        mysql_async::Error::Io(e) => ConnectionError::Unreachable {
            address: config.address(),
            details: e.to_string(),
        },
        mysql_async::Error::Server(e) => match e.code {
            ER_ACCESS_DENIED | ER_DBACCESS_DENIED | ER_ACCESS_DENIED_NO_PASSWORD => {
                ConnectionError::AuthenticationFailed {
                    user: config.user.clone(),
                    details: e.message.clone(),
                }
            }
            ER_BAD_DB => ConnectionError::DatabaseNotFound {
                database: config.database.clone(),
            },
            code => ConnectionError::Driver {
                details: format!("server error {code}: {}", e.message),
            },
        },
        other => ConnectionError::Driver {
            details: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_async::ServerError;

    fn server_error(code: u16, message: &str) -> mysql_async::Error {
        mysql_async::Error::Server(ServerError {
            code,
            message: message.to_string(),
            state: "28000".to_string(),
        })
    }

    #[test]
    fn test_classify_access_denied() {
        let config = ConnectionConfig::default();
        let err = classify(&server_error(1045, "Access denied for user 'root'"), &config);
        assert!(
            matches!(err, ConnectionError::AuthenticationFailed { ref user, .. } if user == "root")
        );
    }

    #[test]
    fn test_classify_unknown_database() {
        let config = ConnectionConfig::default();
        let err = classify(&server_error(1049, "Unknown database 'filesystem'"), &config);
        assert!(matches!(
            err,
            ConnectionError::DatabaseNotFound { ref database } if database == "filesystem"
        ));
    }

    #[test]
    fn test_classify_io_as_unreachable() {
        let config = ConnectionConfig::default();
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = classify(&mysql_async::Error::from(io), &config);
        assert!(matches!(
            err,
            ConnectionError::Unreachable { ref address, .. } if address == "localhost:3306"
        ));
        assert!(err.is_transient());
    }

    #[test]
    fn test_classify_other_server_errors_as_driver() {
        let config = ConnectionConfig::default();
        let err = classify(&server_error(1040, "Too many connections"), &config);
        assert!(matches!(err, ConnectionError::Driver { ref details } if details.contains("1040")));
    }

    #[test]
    fn test_provider_keeps_config() {
        let config = ConnectionConfig {
            host: "db.local".to_string(),
            ..ConnectionConfig::default()
        };
        let provider = ConnectionProvider::new(config.clone());
        assert_eq!(provider.config(), &config);
    }
}
