//! `dbconn` - Managed MySQL connections
//!
//! Resolves connection parameters from the environment, opens validated
//! connections with a single attempt, and optionally pools and health-checks
//! them.
//!
//! ```rust,no_run
//! use dbconn::ConnectionProvider;
//!
//! # async fn example() -> Result<(), dbconn::ProviderError> {
//! let provider = ConnectionProvider::from_env()?;
//! let mut conn = provider.acquire().await?;
//! assert!(conn.verify_liveness().await);
//! conn.release().await?;
//! # Ok(())
//! # }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/// Command line interface definitions
pub mod cli;
pub mod commands;
/// Environment and settings-file configuration
pub mod config;
pub mod connection;
pub mod error;
pub mod health;
pub mod pool;
pub mod provider;

pub use config::{ConnectionConfig, PoolConfig, Secret, Settings};
pub use connection::{Connection, ConnectionState};
pub use error::{ConfigError, ConnectionError, ProviderError};
pub use health::{HealthMonitor, HealthReport, HealthStatus};
pub use pool::{ConnectionPool, PoolStatistics};
pub use provider::ConnectionProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
