//! # Observability Infrastructure
//!
//! Structured logging and cache metrics. The cache emits `tracing` events and
//! `metrics` counters on its own; this module only wires them up.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use self::metrics::CacheMetrics;

use crate::config::ObservabilityConfig;
use crate::errors::{Result, SecretCacheError};
use tracing::info;
use validator::Validate;

/// Initialize logging and metrics from `config`.
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    config.validate().map_err(|e| SecretCacheError::invalid_config(e.to_string()))?;

    let installed = init_logging(&config.log_level, config.json_logging)?;

    CacheMetrics::set_enabled(config.enable_metrics);
    if config.enable_metrics {
        CacheMetrics::describe_metrics();
    }

    info!(
        log_level = %config.log_level,
        json_logging = config.json_logging,
        metrics_enabled = config.enable_metrics,
        subscriber_installed = installed,
        "Observability initialized"
    );

    Ok(())
}
