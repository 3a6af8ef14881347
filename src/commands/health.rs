use crate::commands::load_settings;
use crate::config::ConnectionConfig;
use crate::health::{HealthCheckConfig, HealthMonitor, HealthStatus};
use crate::provider::ConnectionProvider;
use anyhow::{bail, Result};
use std::path::Path;

/// Handle health command
#[allow(clippy::disallowed_methods)]
pub async fn handle_health(settings_path: Option<&Path>) -> Result<()> {
    let config = ConnectionConfig::from_env()?;
    let settings = load_settings(settings_path)?;
    let pool = ConnectionProvider::new(config.clone()).pool(&settings.pool).await?;
    let monitor = HealthMonitor::new(pool, Some(HealthCheckConfig::from(&settings.health)));

    let report = monitor.check().await;

    let icon = match report.status {
        HealthStatus::Healthy => "✅",
        HealthStatus::Degraded | HealthStatus::Warning => "⚠️ ",
        HealthStatus::Critical => "❌",
    };

    println!("🩺 dbconn Health");
    println!("================");
    println!("{icon} Status:      {}", report.status);
    println!("   Target:      {}/{}", config.address(), config.database);
    match report.connectivity.latency_ms {
        Some(latency) => println!("   Latency:     {latency:.1}ms"),
        None => println!("   Latency:     n/a"),
    }
    if let Some(version) = &report.connectivity.server_version {
        println!("   Server:      {version}");
    }
    println!(
        "   Pool:        {} open, {} idle, {} max ({:.0}% used)",
        report.pool_stats.connections,
        report.pool_stats.idle_connections,
        report.pool_stats.max_size,
        report.pool_stats.utilization_percent
    );

    if !report.issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in &report.issues {
            println!("   - {}", issue.description);
            println!("     {}", issue.recommendation);
        }
    }

    if report.status == HealthStatus::Critical {
        bail!("Database is not healthy");
    }
    Ok(())
}
