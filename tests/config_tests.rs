use dbconn::config::{ConnectionConfig, Settings};
use dbconn::ConfigError;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_explicit_values_override_defaults() {
    let env = env_map(&[
        ("DB_HOST", "db.local"),
        ("DB_PORT", "5432"),
        ("DB_USER", "svc"),
        ("DB_PASSWORD", "x"),
        ("DB_NAME", "app"),
    ]);

    let config = ConnectionConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

    assert_eq!(config.host, "db.local");
    assert_eq!(config.port, 5432);
    assert_eq!(config.user, "svc");
    assert_eq!(config.password.expose(), "x");
    assert_eq!(config.database, "app");
}

#[test]
fn test_non_numeric_port_is_config_error() {
    let env = env_map(&[("DB_PORT", "notanumber")]);
    let result = ConnectionConfig::from_lookup(|key| env.get(key).cloned());

    match result {
        Err(ConfigError::InvalidPort { value }) => assert_eq!(value, "notanumber"),
        other => panic!("expected InvalidPort, got {other:?}"),
    }
}

#[test]
fn test_out_of_range_ports_are_rejected() {
    for raw in ["0", "70000", "3306.5"] {
        let env = env_map(&[("DB_PORT", raw)]);
        let result = ConnectionConfig::from_lookup(|key| env.get(key).cloned());
        assert!(
            matches!(result, Err(ConfigError::InvalidPort { .. })),
            "port {raw:?} should be rejected"
        );
    }
}

#[test]
fn test_password_not_in_debug_output() {
    let env = env_map(&[("DB_PASSWORD", "s3cret-value")]);
    let config = ConnectionConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
    assert!(!format!("{config:?}").contains("s3cret-value"));
}

#[test]
fn test_settings_loading() {
    let settings = Settings::from_file("tests/fixtures/dbconn.toml").unwrap();
    assert_eq!(settings.pool.max_size, 4);
    assert_eq!(settings.pool.min_idle, Some(1));
    assert_eq!(settings.pool.connection_timeout_secs, 5);
    assert!(!settings.pool.test_on_check_out);
    // unset fields fall back to defaults
    assert_eq!(settings.pool.idle_timeout_secs, Some(600));
    assert_eq!(settings.health.check_interval_secs, 10);
    assert_eq!(settings.health.check_timeout_secs, 5);
}

#[test]
fn test_settings_missing_file() {
    let result = Settings::from_file("nonexistent.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_settings_malformed_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[pool]\nmax_size = \"ten\"").unwrap();

    let result = Settings::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn test_settings_invalid_pool_sizing() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[pool]\nmax_size = 2\nmin_idle = 5").unwrap();

    let result = Settings::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
