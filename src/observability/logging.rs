//! # Structured Logging
//!
//! Subscriber setup for the `tracing` events the cache emits. Secret payloads
//! are never part of an event; only identifiers, stages, and error messages are.

use crate::config::CacheConfig;
use crate::errors::{Result, SecretCacheError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Install a global subscriber filtered at `level`.
///
/// `RUST_LOG` takes precedence over `level` when set. Returns `Ok(false)` if a
/// global subscriber was already installed, which is not treated as an error.
pub fn init_logging(level: &str, json: bool) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| {
            SecretCacheError::invalid_config(format!("Invalid log level '{}': {}", level, e))
        })?,
    };

    let registry = Registry::default().with(filter);

    #[cfg(feature = "json-logs")]
    let installed = if json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    #[cfg(not(feature = "json-logs"))]
    let installed = {
        if json {
            tracing::warn!("JSON logging requested but the json-logs feature is disabled");
        }
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    };

    Ok(installed)
}

/// Log the cache configuration at construction time.
pub fn log_config_info(config: &CacheConfig) {
    tracing::info!(
        max_cache_size = config.max_cache_size,
        cache_item_ttl_ns = config.cache_item_ttl,
        version_stage = %config.version_stage,
        hook_installed = config.hook.is_some(),
        "Secret cache configuration"
    );
}
