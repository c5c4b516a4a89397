//! Metrics definitions for the token service
//!
//! All metrics follow Prometheus naming conventions:
//! - `sts_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `outcome`: issued, reused, rejected, error
//! - `status`: valid, invalid
//! - `reason`: none, revoked, expired, malformed, signature_invalid, header
//! - `cache`: validation, client, session
//! - `result`: hit, miss
//! - `operation`: store and admin operation names
//! - `action`: allowed, rejected

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Issuance includes a bcrypt verification (~200ms at cost 12)
        .set_buckets_for_metric(
            Matcher::Prefix("sts_token_issuance".to_string()),
            &[
                0.010, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `sts_token_issuance_duration_seconds`, `sts_token_issuance_total`
/// Labels: `outcome`
pub fn record_token_issuance(outcome: &str, duration: Duration) {
    histogram!("sts_token_issuance_duration_seconds", "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());

    counter!("sts_token_issuance_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record token validation result
///
/// Metric: `sts_token_validations_total`
/// Labels: `status`, `reason`
pub fn record_token_validation(status: &str, reason: Option<&str>) {
    let reason = reason.unwrap_or("none");
    counter!("sts_token_validations_total", "status" => status.to_string(), "reason" => reason.to_string())
        .increment(1);
}

// ============================================================================
// Cache & Store Metrics
// ============================================================================

/// Metric: `sts_cache_lookups_total`
/// Labels: `cache`, `result`
pub fn record_cache_lookup(cache: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("sts_cache_lookups_total", "cache" => cache.to_string(), "result" => result)
        .increment(1);
}

/// Record a store failure that was recovered locally
///
/// Metric: `sts_store_errors_total`
/// Labels: `operation`
pub fn record_store_error(operation: &str) {
    counter!("sts_store_errors_total", "operation" => operation.to_string()).increment(1);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Record rate limit decision
///
/// Metric: `sts_rate_limit_decisions_total`
/// Labels: `action` (allowed, rejected)
pub fn record_rate_limit_decision(action: &str) {
    counter!("sts_rate_limit_decisions_total", "action" => action.to_string()).increment(1);
}

// ============================================================================
// Admin & Database Metrics
// ============================================================================

/// Metric: `sts_admin_operations_total`
/// Labels: `operation`
pub fn record_admin_operation(operation: &str) {
    counter!("sts_admin_operations_total", "operation" => operation.to_string()).increment(1);
}

/// Record database query execution
///
/// Metric: `sts_db_query_duration_seconds`, `sts_db_queries_total`
/// Labels: `operation`, `table`, `status`
pub fn record_db_query(operation: &str, table: &str, status: &str, duration: Duration) {
    histogram!("sts_db_query_duration_seconds", "operation" => operation.to_string(), "table" => table.to_string())
        .record(duration.as_secs_f64());

    counter!("sts_db_queries_total", "operation" => operation.to_string(), "table" => table.to_string(), "status" => status.to_string())
        .increment(1);
}
