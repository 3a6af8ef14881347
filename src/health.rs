//! Database health monitoring
//!
//! This module provides:
//! - One-shot health checks over a connection pool
//! - Periodic background monitoring with the latest report kept in memory
//! - Classification of latency and pool pressure into a [`HealthStatus`]

use crate::config::HealthSettings;
use crate::pool::{ConnectionPool, PoolStatistics};
use chrono::{DateTime, Utc};
use mysql_async::prelude::Queryable;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Health check status, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Minor issues detected but functional
    Degraded,
    /// Major issues, some functionality affected
    Warning,
    /// Database unreachable or unusably slow
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "HEALTHY"),
            Self::Degraded => write!(f, "DEGRADED"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Types of health issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthIssueType {
    /// Ping failed or no connection could be checked out
    ConnectionFailure,
    /// Ping round trip above threshold
    HighLatency,
    /// Too many connections checked out
    PoolPressure,
}

/// A problem found during a health check
#[derive(Debug, Clone)]
pub struct HealthIssue {
    /// Type of issue
    pub issue_type: HealthIssueType,
    /// Status this issue alone would warrant
    pub severity: HealthStatus,
    /// Human-readable description
    pub description: String,
    /// Recommended action to resolve
    pub recommendation: String,
}

/// Database connectivity metrics
#[derive(Debug, Clone, Default)]
pub struct ConnectivityMetrics {
    /// Whether a pooled connection answered a ping
    pub can_connect: bool,
    /// Ping round trip in milliseconds
    pub latency_ms: Option<f64>,
    /// Server version as `major.minor.patch`
    pub server_version: Option<String>,
    /// Why the probe failed, if it did
    pub error: Option<String>,
}

/// Result of one health check
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Worst status across all issues
    pub status: HealthStatus,
    /// Connectivity information
    pub connectivity: ConnectivityMetrics,
    /// Pool occupancy at check time
    pub pool_stats: PoolStatistics,
    /// Issues detected
    pub issues: Vec<HealthIssue>,
    /// When this report was produced
    pub checked_at: DateTime<Utc>,
}

/// Thresholds for determining health status
#[derive(Debug, Clone)]
pub struct HealthThresholds {
    /// Connection latency (ms) that triggers degraded status
    pub latency_warning_ms: f64,
    /// Connection latency (ms) that triggers critical status
    pub latency_critical_ms: f64,
    /// Pool utilization % that triggers degraded status
    pub pool_utilization_warning: f32,
    /// Pool utilization % that triggers warning status
    pub pool_utilization_critical: f32,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            latency_warning_ms: 100.0,
            latency_critical_ms: 500.0,
            pool_utilization_warning: 70.0,
            pool_utilization_critical: 90.0,
        }
    }
}

/// Configuration for health monitoring
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// How often to run health checks
    pub check_interval: Duration,
    /// Timeout for a single probe
    pub check_timeout: Duration,
    /// Classification thresholds
    pub thresholds: HealthThresholds,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            check_timeout: Duration::from_secs(5),
            thresholds: HealthThresholds::default(),
        }
    }
}

impl From<&HealthSettings> for HealthCheckConfig {
    fn from(settings: &HealthSettings) -> Self {
        Self {
            check_interval: Duration::from_secs(settings.check_interval_secs.max(1)),
            check_timeout: Duration::from_secs(settings.check_timeout_secs.max(1)),
            thresholds: HealthThresholds {
                latency_warning_ms: settings.latency_warning_ms,
                latency_critical_ms: settings.latency_critical_ms,
                pool_utilization_warning: settings.pool_utilization_warning,
                pool_utilization_critical: settings.pool_utilization_critical,
            },
        }
    }
}

/// Database health monitor
pub struct HealthMonitor {
    pool: ConnectionPool,
    config: HealthCheckConfig,
    latest: Arc<RwLock<Option<HealthReport>>>,
}

impl HealthMonitor {
    /// Create a new health monitor
    #[must_use]
    pub fn new(pool: ConnectionPool, config: Option<HealthCheckConfig>) -> Self {
        Self {
            pool,
            config: config.unwrap_or_default(),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Most recent report produced by [`start`](Self::start) or [`check`](Self::check)
    #[must_use]
    pub fn latest(&self) -> Option<HealthReport> {
        self.latest.read().ok().and_then(|guard| guard.clone())
    }

    /// Run a single health check
    pub async fn check(&self) -> HealthReport {
        let report = Self::perform_check(&self.pool, &self.config).await;
        if let Ok(mut guard) = self.latest.write() {
            *guard = Some(report.clone());
        }
        report
    }

    /// Start continuous health monitoring in the background
    pub fn start(&self) -> JoinHandle<()> {
        info!("Starting database health monitoring");

        let pool = self.pool.clone();
        let config = self.config.clone();
        let latest = Arc::clone(&self.latest);

        tokio::spawn(async move {
            let mut previous: Option<HealthStatus> = None;
            loop {
                let started = Instant::now();
                let report = Self::perform_check(&pool, &config).await;

                if previous != Some(report.status) {
                    match report.status {
                        HealthStatus::Healthy => info!("Database health is HEALTHY"),
                        HealthStatus::Degraded | HealthStatus::Warning => warn!(
                            status = %report.status,
                            issues = report.issues.len(),
                            "Database health changed"
                        ),
                        HealthStatus::Critical => error!(
                            issues = report.issues.len(),
                            "Database health is CRITICAL"
                        ),
                    }
                    previous = Some(report.status);
                }

                if let Ok(mut guard) = latest.write() {
                    *guard = Some(report);
                }

                let elapsed = started.elapsed();
                let pause = config.check_interval.saturating_sub(elapsed);
                sleep(pause.max(Duration::from_secs(1))).await;
            }
        })
    }

    async fn perform_check(pool: &ConnectionPool, config: &HealthCheckConfig) -> HealthReport {
        debug!("Running health check");
        let connectivity = Self::check_connectivity(pool, config.check_timeout).await;
        let pool_stats = pool.statistics();
        let (status, issues) = analyze(&connectivity, &pool_stats, &config.thresholds);

        HealthReport {
            status,
            connectivity,
            pool_stats,
            issues,
            checked_at: Utc::now(),
        }
    }

    async fn check_connectivity(pool: &ConnectionPool, timeout: Duration) -> ConnectivityMetrics {
        // latency covers the ping round trip only, not checkout or a cold handshake
        let round_trip = async {
            let mut conn = pool.get().await.map_err(|e| e.to_string())?;
            let started = Instant::now();
            conn.ping().await.map_err(|e| e.to_string())?;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            let (major, minor, patch) = conn.server_version();
            Ok::<_, String>((latency_ms, format!("{major}.{minor}.{patch}")))
        };

        let outcome = match tokio::time::timeout(timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(format!("health probe timed out after {timeout:?}")),
        };

        match outcome {
            Ok((latency_ms, version)) => ConnectivityMetrics {
                can_connect: true,
                latency_ms: Some(latency_ms),
                server_version: Some(version),
                error: None,
            },
            Err(e) => ConnectivityMetrics {
                can_connect: false,
                latency_ms: None,
                server_version: None,
                error: Some(e),
            },
        }
    }
}

/// Classify metrics into an overall status and the issues behind it
#[must_use]
pub fn analyze(
    connectivity: &ConnectivityMetrics,
    pool_stats: &PoolStatistics,
    thresholds: &HealthThresholds,
) -> (HealthStatus, Vec<HealthIssue>) {
    let mut issues = Vec::new();

    if !connectivity.can_connect {
        issues.push(HealthIssue {
            issue_type: HealthIssueType::ConnectionFailure,
            severity: HealthStatus::Critical,
            description: connectivity.error.as_ref().map_or_else(
                || "Cannot connect to database".to_string(),
                |e| format!("Cannot connect to database: {e}"),
            ),
            recommendation: "Check database server status and network connectivity".to_string(),
        });
    } else if let Some(latency) = connectivity.latency_ms {
        if latency > thresholds.latency_critical_ms {
            issues.push(HealthIssue {
                issue_type: HealthIssueType::HighLatency,
                severity: HealthStatus::Critical,
                description: format!("High connection latency: {latency:.1}ms"),
                recommendation: "Check network performance and database load".to_string(),
            });
        } else if latency > thresholds.latency_warning_ms {
            issues.push(HealthIssue {
                issue_type: HealthIssueType::HighLatency,
                severity: HealthStatus::Degraded,
                description: format!("Elevated connection latency: {latency:.1}ms"),
                recommendation: "Monitor network and database performance".to_string(),
            });
        }
    }

    if pool_stats.utilization_percent > thresholds.pool_utilization_critical {
        issues.push(HealthIssue {
            issue_type: HealthIssueType::PoolPressure,
            severity: HealthStatus::Warning,
            description: format!(
                "Critical pool utilization: {:.1}%",
                pool_stats.utilization_percent
            ),
            recommendation: "Increase pool.max_size or release connections sooner".to_string(),
        });
    } else if pool_stats.utilization_percent > thresholds.pool_utilization_warning {
        issues.push(HealthIssue {
            issue_type: HealthIssueType::PoolPressure,
            severity: HealthStatus::Degraded,
            description: format!(
                "High pool utilization: {:.1}%",
                pool_stats.utilization_percent
            ),
            recommendation: "Monitor connection usage".to_string(),
        });
    }

    let status = issues
        .iter()
        .map(|issue| issue.severity)
        .max()
        .unwrap_or(HealthStatus::Healthy);

    (status, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reachable(latency_ms: f64) -> ConnectivityMetrics {
        ConnectivityMetrics {
            can_connect: true,
            latency_ms: Some(latency_ms),
            server_version: Some("8.0.36".to_string()),
            error: None,
        }
    }

    #[test]
    fn test_healthy_when_fast_and_idle() {
        let (status, issues) = analyze(
            &reachable(5.0),
            &PoolStatistics::from_counts(2, 2, 10),
            &HealthThresholds::default(),
        );
        assert_eq!(status, HealthStatus::Healthy);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unreachable_is_critical() {
        let connectivity = ConnectivityMetrics {
            error: Some("Connection refused".to_string()),
            ..ConnectivityMetrics::default()
        };
        let (status, issues) = analyze(
            &connectivity,
            &PoolStatistics::default(),
            &HealthThresholds::default(),
        );
        assert_eq!(status, HealthStatus::Critical);
        assert_eq!(issues[0].issue_type, HealthIssueType::ConnectionFailure);
        assert!(issues[0].description.contains("Connection refused"));
    }

    #[test]
    fn test_latency_bands() {
        let thresholds = HealthThresholds::default();
        let idle = PoolStatistics::from_counts(1, 1, 10);

        let (status, _) = analyze(&reachable(150.0), &idle, &thresholds);
        assert_eq!(status, HealthStatus::Degraded);

        let (status, _) = analyze(&reachable(750.0), &idle, &thresholds);
        assert_eq!(status, HealthStatus::Critical);
    }

    #[test]
    fn test_worst_issue_wins() {
        // 10 of 10 checked out, plus elevated latency
        let (status, issues) = analyze(
            &reachable(150.0),
            &PoolStatistics::from_counts(10, 0, 10),
            &HealthThresholds::default(),
        );
        assert_eq!(issues.len(), 2);
        assert_eq!(status, HealthStatus::Warning);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = HealthSettings {
            check_interval_secs: 0,
            latency_warning_ms: 20.0,
            ..HealthSettings::default()
        };
        let config = HealthCheckConfig::from(&settings);
        assert_eq!(config.check_interval, Duration::from_secs(1));
        assert!((config.thresholds.latency_warning_ms - 20.0).abs() < f64::EPSILON);
    }
}
