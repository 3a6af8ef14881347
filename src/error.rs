//! Error types for configuration resolution and connection acquisition
//!
//! Two failure families exist:
//! - [`ConfigError`] for malformed configuration (bad port, invalid pool sizing)
//! - [`ConnectionError`] for failures at connect time (network, auth, missing database)
//!
//! Neither is recovered internally. [`ProviderError`] unifies both for callers
//! that go through a full load-then-acquire flow.

use thiserror::Error;
use tracing::{error, warn};

/// Errors raised while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The port value is present but is not an integer in `1..=65535`
    #[error("Invalid port value: {value:?} (expected an integer between 1 and 65535)")]
    InvalidPort {
        /// The raw value that failed to parse
        value: String,
    },

    /// A setting is outside its allowed range
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue {
        /// Name of the offending setting
        field: String,
        /// The rejected value
        value: String,
    },

    /// IO error occurred while reading a settings file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error occurred
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while opening or using a connection
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// The server could not be reached (refused, unresolved, dropped during handshake)
    #[error("Database server unreachable at {address}: {details}")]
    Unreachable {
        /// `host:port` that was dialed
        address: String,
        /// Driver-reported cause
        details: String,
    },

    /// The server rejected the credentials
    #[error("Authentication failed for user '{user}': {details}")]
    AuthenticationFailed {
        /// User that attempted to log in
        user: String,
        /// Server-reported cause
        details: String,
    },

    /// The target database does not exist
    #[error("Database not found: {database}")]
    DatabaseNotFound {
        /// Requested database name
        database: String,
    },

    /// A bounded wait expired
    #[error("Timeout during operation: {operation}")]
    Timeout {
        /// What was being waited on
        operation: String,
    },

    /// The connection has been released or was found broken
    #[error("Connection is closed")]
    Closed,

    /// Any other driver failure
    #[error("Driver error: {details}")]
    Driver {
        /// Driver-reported cause
        details: String,
    },
}

/// Unified error for load-then-acquire flows
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A connection could not be obtained
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

impl ConnectionError {
    /// Whether trying again later could plausibly succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }
}

impl ProviderError {
    /// Check if error is recoverable by the caller retrying later
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Connection(e) => e.is_transient(),
        }
    }

    /// Get user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(source) => format!("Configuration issue: {source}"),
            Self::Connection(ConnectionError::AuthenticationFailed { user, .. }) => {
                format!("Access denied for user '{user}'. Check DB_USER and DB_PASSWORD")
            }
            Self::Connection(ConnectionError::DatabaseNotFound { database }) => {
                format!("Database '{database}' does not exist. Check DB_NAME")
            }
            Self::Connection(source) => format!("Database problem: {source}"),
        }
    }

    /// Log the error at a level matching how actionable it is
    pub fn log(&self) {
        if self.is_recoverable() {
            warn!(error = %self, recoverable = true, "Provider operation failed");
        } else {
            error!(error = %self, recoverable = false, "Provider operation failed");
        }
    }
}
