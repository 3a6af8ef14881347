//! Database connection management
//!
//! A [`Connection`] is either Open or Closed. It becomes Closed when the
//! caller releases it or when a liveness probe finds it broken; Closed is
//! terminal. Dropping an Open connection releases it as well.

use crate::error::ConnectionError;
use mysql_async::prelude::Queryable;
use mysql_async::Conn;
use tracing::{debug, warn};

/// Lifecycle state of a [`Connection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Usable
    Open,
    /// Released or broken; no further operations are valid
    Closed,
}

/// Live handle to an open MySQL session, owned by the caller
pub struct Connection {
    conn: Option<Conn>,
    address: String,
    database: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("database", &self.database)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    pub(crate) fn open(conn: Conn, address: String, database: String) -> Self {
        Self {
            conn: Some(conn),
            address,
            database,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    /// Whether the connection has not been released or found broken
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// `host:port` this connection was opened against
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Target database name
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Probe whether the connection is currently usable
    ///
    /// Sends a ping. A failed ping closes the connection, so later calls
    /// return `false` without touching the network.
    pub async fn verify_liveness(&mut self) -> bool {
        let Some(conn) = self.conn.as_mut() else {
            return false;
        };

        match conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    address = %self.address,
                    error = %e,
                    "Liveness probe failed, closing connection"
                );
                self.conn = None;
                false
            }
        }
    }

    /// Server version reported during the handshake
    pub fn server_version(&self) -> Result<(u16, u16, u16), ConnectionError> {
        self.conn
            .as_ref()
            .map(|conn| conn.server_version())
            .ok_or(ConnectionError::Closed)
    }

    /// Borrow the underlying driver connection
    pub fn driver_mut(&mut self) -> Result<&mut Conn, ConnectionError> {
        self.conn.as_mut().ok_or(ConnectionError::Closed)
    }

    /// Release the connection in place, leaving this handle Closed
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        let conn = self.conn.take().ok_or(ConnectionError::Closed)?;
        debug!(address = %self.address, "Releasing connection");
        conn.disconnect().await.map_err(|e| ConnectionError::Driver {
            details: e.to_string(),
        })
    }

    /// Release the connection, consuming the handle
    pub async fn release(mut self) -> Result<(), ConnectionError> {
        self.close().await
    }
}
