//! # Metrics Collection
//!
//! Cache counters recorded through the `metrics` facade. Installing an
//! exporter is left to the application; without one the macros are no-ops.

use metrics::{counter, describe_counter, Unit};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Counters for cache lookups, refreshes, and evictions.
///
/// Every counter carries a `layer` label: `secret` for the top-level container
/// and metadata refreshes, `version` for the per-secret version containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    /// Turn recording on or off process-wide.
    pub fn set_enabled(enabled: bool) {
        METRICS_ENABLED.store(enabled, Ordering::Relaxed);
    }

    /// Whether counters are currently recorded.
    pub fn is_enabled() -> bool {
        METRICS_ENABLED.load(Ordering::Relaxed)
    }

    /// Record a container lookup. `outcome` is `hit` or `miss`.
    pub fn record_lookup(layer: &str, outcome: &str) {
        if !Self::is_enabled() {
            return;
        }
        let labels = [("layer", layer.to_string()), ("outcome", outcome.to_string())];
        counter!("secretcache_lookups_total", &labels).increment(1);
    }

    /// Record a refresh attempt against the backend.
    pub fn record_refresh(layer: &str, success: bool) {
        if !Self::is_enabled() {
            return;
        }
        let status = if success { "success" } else { "error" };
        let labels = [("layer", layer.to_string()), ("status", status.to_string())];
        counter!("secretcache_refreshes_total", &labels).increment(1);
    }

    /// Record an entry evicted from a full container.
    pub fn record_eviction(layer: &str) {
        if !Self::is_enabled() {
            return;
        }
        let labels = [("layer", layer.to_string())];
        counter!("secretcache_evictions_total", &labels).increment(1);
    }

    /// Register descriptions so exporters show the counters before they move.
    pub fn describe_metrics() {
        describe_counter!(
            "secretcache_lookups_total",
            Unit::Count,
            "Cache container lookups grouped by layer and outcome"
        );
        describe_counter!(
            "secretcache_refreshes_total",
            Unit::Count,
            "Backend refresh attempts grouped by layer and status"
        );
        describe_counter!(
            "secretcache_evictions_total",
            Unit::Count,
            "Entries evicted from full cache containers"
        );
    }
}
