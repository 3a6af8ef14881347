//! Command handlers for the `dbconn` binary

pub mod check;
pub mod health;
pub mod show_config;

use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;

/// Settings file picked up from the working directory when `--config` is absent
pub const DEFAULT_SETTINGS_FILE: &str = "dbconn.toml";

/// Load settings from an explicit file, the default file, or built-in defaults
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
            Settings::from_file(DEFAULT_SETTINGS_FILE)
                .with_context(|| format!("Failed to load settings from {DEFAULT_SETTINGS_FILE}"))
        }
        None => Ok(Settings::default()),
    }
}
