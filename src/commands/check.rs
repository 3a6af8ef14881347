use crate::commands::load_settings;
use crate::config::ConnectionConfig;
use crate::error::ProviderError;
use crate::provider::ConnectionProvider;
use anyhow::{anyhow, Result};
use mysql_async::prelude::Queryable;
use std::path::Path;
use std::time::Duration;

/// Handle check command
#[allow(clippy::disallowed_methods)]
pub async fn handle_check(
    settings_path: Option<&Path>,
    use_pool: bool,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let config = ConnectionConfig::from_env()?;

    println!(
        "🔌 Connecting to {}@{}/{}...",
        config.user,
        config.address(),
        config.database
    );

    if use_pool {
        check_pooled(config, settings_path).await
    } else {
        check_direct(config, timeout_secs).await
    }
}

#[allow(clippy::disallowed_methods)]
async fn check_direct(config: ConnectionConfig, timeout_secs: Option<u64>) -> Result<()> {
    let mut provider = ConnectionProvider::new(config);
    if let Some(secs) = timeout_secs {
        provider = provider.with_connect_timeout(Duration::from_secs(secs));
    }

    let mut conn = match provider.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            let error = ProviderError::from(e);
            println!("❌ Failed to connect to MySQL database");
            return Err(anyhow!(error.user_message()));
        }
    };

    if !conn.verify_liveness().await {
        println!("❌ Failed to connect to MySQL database");
        return Err(anyhow!("Connection opened but did not answer a ping"));
    }

    let (major, minor, patch) = conn.server_version()?;
    println!("✅ Connected to MySQL database (server {major}.{minor}.{patch})");
    conn.release().await?;
    Ok(())
}

#[allow(clippy::disallowed_methods)]
async fn check_pooled(config: ConnectionConfig, settings_path: Option<&Path>) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let pool = ConnectionProvider::new(config).pool(&settings.pool).await?;

    let mut conn = match pool.get().await {
        Ok(conn) => conn,
        Err(e) => {
            let error = ProviderError::from(e);
            println!("❌ Failed to connect to MySQL database");
            return Err(anyhow!(error.user_message()));
        }
    };

    if let Err(e) = conn.ping().await {
        println!("❌ Failed to connect to MySQL database");
        return Err(anyhow!("Pooled connection did not answer a ping: {e}"));
    }
    drop(conn);

    let stats = pool.statistics();
    println!(
        "✅ Connected to MySQL database (pool: {}/{} connections)",
        stats.connections, stats.max_size
    );
    Ok(())
}
