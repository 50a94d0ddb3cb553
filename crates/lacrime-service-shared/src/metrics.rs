//! Prometheus metrics infrastructure.
//!
//! This module provides:
//! - [`MetricsConfig`]: Configuration for the metrics system
//! - [`init_metrics`]: Initialize the Prometheus metrics recorder
//! - [`metrics_handler`]: Axum handler for `/metrics` endpoint
//! - Business metric helpers for incident queries and boundary files

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// Create configuration from environment variables.
    ///
    /// - `METRICS_ENABLED`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self { enabled }
    }
}

/// Initialize the Prometheus metrics recorder.
///
/// This must be called once at application startup before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if metrics are disabled, the recorder has already been
/// installed, or the Prometheus builder fails to install.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler for the `/metrics` endpoint.
///
/// Returns Prometheus exposition format text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    /// Metrics are disabled in configuration.
    Disabled,
    /// The recorder has already been installed.
    AlreadyInitialized,
    /// The Prometheus builder failed to install.
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Record how many incidents a query returned.
///
/// Records to the `lacrime_incidents_returned` histogram.
///
/// # Arguments
///
/// * `query` - The query kind ("all", "keyword", "other")
pub fn record_incidents_returned(count: usize, query: &str) {
    metrics::histogram!(
        "lacrime_incidents_returned",
        "query" => query.to_string()
    )
    .record(count as f64);
}

/// Record a failed incident query.
///
/// Increments the `lacrime_queries_failed_total` counter.
pub fn record_query_failed(query: &str) {
    metrics::counter!(
        "lacrime_queries_failed_total",
        "query" => query.to_string()
    )
    .increment(1);
}

/// Record features served from a boundary file.
///
/// Increments the `lacrime_features_served_total` counter by `count`.
///
/// # Arguments
///
/// * `asset` - The boundary file label ("stations", "cityareas")
pub fn record_features_served(count: usize, asset: &str) {
    metrics::counter!(
        "lacrime_features_served_total",
        "asset" => asset.to_string()
    )
    .increment(count as u64);
}

/// Record a boundary file that could not be served.
///
/// Increments the `lacrime_geo_asset_failures_total` counter.
pub fn record_geo_asset_failed(asset: &str, reason: &str) {
    metrics::counter!(
        "lacrime_geo_asset_failures_total",
        "asset" => asset.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
    }

    #[test]
    fn test_init_metrics_disabled() {
        let config = MetricsConfig { enabled: false };
        assert!(matches!(init_metrics(&config), Err(MetricsError::Disabled)));
    }

    #[tokio::test]
    async fn test_metrics_handler_returns_prometheus_format() {
        let output = metrics_handler().await;
        assert!(
            output.contains('#') || output.is_empty(),
            "Metrics output should be Prometheus format or indicate not initialized"
        );
    }

    #[test]
    fn test_business_metric_helpers() {
        // Without an installed recorder these are no-ops; they must not panic.
        record_incidents_returned(12, "all");
        record_incidents_returned(0, "keyword");
        record_query_failed("other");
        record_features_served(21, "stations");
        record_geo_asset_failed("cityareas", "not_found");
    }

    #[test]
    fn test_metrics_error_display() {
        assert_eq!(MetricsError::Disabled.to_string(), "metrics are disabled");
        assert_eq!(
            MetricsError::AlreadyInitialized.to_string(),
            "metrics recorder already initialized"
        );
        let failed = MetricsError::InstallFailed("test error".to_string());
        assert!(failed.to_string().contains("test error"));
    }
}
