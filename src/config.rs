//! Configuration management for dbconn
//!
//! Connection parameters come from the process environment (`DB_HOST`,
//! `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`) with one default table in
//! [`defaults`]. Pool and health-check tuning comes from an optional TOML
//! settings file.

use crate::error::ConfigError;
use mysql_async::{Opts, OptsBuilder};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the database host
pub const ENV_HOST: &str = "DB_HOST";
/// Environment variable holding the database port
pub const ENV_PORT: &str = "DB_PORT";
/// Environment variable holding the username
pub const ENV_USER: &str = "DB_USER";
/// Environment variable holding the password
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
/// Environment variable holding the target database
pub const ENV_DATABASE: &str = "DB_NAME";

/// Values used when a variable is unset
pub mod defaults {
    /// Default database host
    pub const HOST: &str = "localhost";
    /// Default database port
    pub const PORT: u16 = 3306;
    /// Default username
    pub const USER: &str = "root";
    /// Default password (empty)
    pub const PASSWORD: &str = "";
    /// Default target database
    pub const DATABASE: &str = "filesystem";
}

/// A password that never shows up in `Debug` or `Display` output
///
/// Deliberately not `Serialize`; write the raw value out only through
/// [`Secret::expose`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is the empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Resolved set of parameters needed to open a database connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: Secret,
    /// Target database/schema
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            user: defaults::USER.to_string(),
            password: Secret::new(defaults::PASSWORD),
            database: defaults::DATABASE.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Resolve configuration from the process environment
    ///
    /// Reads the environment at call time. Load once at startup and pass the
    /// result around rather than calling this repeatedly.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup
    ///
    /// A key that resolves to `Some` is considered set, even when empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(ENV_PORT) {
            Some(raw) => parse_port(&raw)?,
            None => defaults::PORT,
        };

        Ok(Self {
            host: lookup(ENV_HOST).unwrap_or_else(|| defaults::HOST.to_string()),
            port,
            user: lookup(ENV_USER).unwrap_or_else(|| defaults::USER.to_string()),
            password: lookup(ENV_PASSWORD)
                .map_or_else(|| Secret::new(defaults::PASSWORD), Secret::from),
            database: lookup(ENV_DATABASE).unwrap_or_else(|| defaults::DATABASE.to_string()),
        })
    }

    /// `host:port` as dialed by the driver
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build driver options for a single TCP connection attempt
    #[must_use]
    pub fn driver_opts(&self) -> Opts {
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.expose().to_string()))
            .db_name(Some(self.database.clone()))
            // no second hop over the local socket after the TCP handshake
            .prefer_socket(false)
            .into()
    }
}

/// Parse a port value, rejecting anything outside `1..=65535`
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            value: raw.to_string(),
        }),
    }
}

/// Connection pool sizing and checkout behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections managed by the pool
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    /// Idle connections the pool keeps open (none by default, so building never connects)
    #[serde(default)]
    pub min_idle: Option<u32>,
    /// Seconds to wait for a connection before giving up
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
    /// Seconds before an idle connection is closed
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: Option<u64>,
    /// Ping connections before handing them out
    #[serde(default = "default_test_on_check_out")]
    pub test_on_check_out: bool,
}

const fn default_max_size() -> u32 {
    10
}

const fn default_connection_timeout_secs() -> u64 {
    30
}

#[allow(clippy::unnecessary_wraps)]
const fn default_idle_timeout_secs() -> Option<u64> {
    Some(600)
}

const fn default_test_on_check_out() -> bool {
    true
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            min_idle: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            test_on_check_out: default_test_on_check_out(),
        }
    }
}

impl PoolConfig {
    /// Check sizing invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.max_size".to_string(),
                value: "0".to_string(),
            });
        }
        if let Some(min_idle) = self.min_idle {
            if min_idle > self.max_size {
                return Err(ConfigError::InvalidValue {
                    field: "pool.min_idle".to_string(),
                    value: format!("{min_idle} (exceeds max_size {})", self.max_size),
                });
            }
        }
        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool.connection_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Checkout timeout as a [`Duration`]
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Idle timeout as a [`Duration`]
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

/// Health-check cadence and thresholds as written in the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Seconds between periodic checks
    pub check_interval_secs: u64,
    /// Seconds a single ping may take before it counts as a failure
    pub check_timeout_secs: u64,
    /// Latency (ms) that marks the database as degraded
    pub latency_warning_ms: f64,
    /// Latency (ms) that marks the database as critical
    pub latency_critical_ms: f64,
    /// Pool utilization % that marks the pool as degraded
    pub pool_utilization_warning: f32,
    /// Pool utilization % that raises a warning
    pub pool_utilization_critical: f32,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            check_timeout_secs: 5,
            latency_warning_ms: 100.0,
            latency_critical_ms: 500.0,
            pool_utilization_warning: 70.0,
            pool_utilization_critical: 90.0,
        }
    }
}

/// Optional settings file
///
/// ```toml
/// [pool]
/// max_size = 4
/// connection_timeout_secs = 5
///
/// [health]
/// check_interval_secs = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Pool tuning
    #[serde(default)]
    pub pool: PoolConfig,
    /// Health-check tuning
    #[serde(default)]
    pub health: HealthSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&contents)?;
        settings.pool.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ConnectionConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ConnectionConfig::default());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user, "root");
        assert!(config.password.is_empty());
        assert_eq!(config.database, "filesystem");
    }

    #[test]
    fn test_partial_overrides_keep_other_defaults() {
        let config =
            ConnectionConfig::from_lookup(lookup_from(&[("DB_HOST", "db.internal")])).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3306);
        assert_eq!(config.database, "filesystem");
    }

    #[test]
    fn test_empty_value_counts_as_set() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[("DB_USER", "")])).unwrap();
        assert_eq!(config.user, "");
    }

    #[test]
    fn test_parse_port_bounds() {
        assert_eq!(parse_port("1").unwrap(), 1);
        assert_eq!(parse_port("65535").unwrap(), 65535);
        assert_eq!(parse_port(" 3307 ").unwrap(), 3307);
        assert!(matches!(parse_port("0"), Err(ConfigError::InvalidPort { .. })));
        assert!(matches!(parse_port("65536"), Err(ConfigError::InvalidPort { .. })));
        assert!(matches!(parse_port("-1"), Err(ConfigError::InvalidPort { .. })));
        assert!(matches!(parse_port(""), Err(ConfigError::InvalidPort { .. })));
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = ConnectionConfig {
            password: Secret::new("hunter2"),
            ..ConnectionConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(config.password.expose(), "hunter2");
        assert_eq!(config.password.to_string(), "[REDACTED]");
    }

    #[test]
    fn test_pool_config_validation() {
        assert!(PoolConfig::default().validate().is_ok());

        let zero = PoolConfig {
            max_size: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidValue { .. })));

        let oversized_idle = PoolConfig {
            max_size: 2,
            min_idle: Some(3),
            ..PoolConfig::default()
        };
        assert!(matches!(
            oversized_idle.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_settings_defaults_from_empty_toml() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.pool.max_size, 10);
        assert_eq!(settings.health.check_timeout_secs, 5);
    }
}
