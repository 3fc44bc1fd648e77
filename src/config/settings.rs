//! # Configuration Settings
//!
//! Defines the configuration structures for the secret cache.

use crate::cache::hook::CacheHook;
use crate::errors::{Result, SecretCacheError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use super::{DEFAULT_CACHE_ITEM_TTL, DEFAULT_MAX_CACHE_SIZE, DEFAULT_VERSION_STAGE};

/// Configuration for a [`SecretCache`](crate::SecretCache).
///
/// Read-only once the cache is built.
#[derive(Clone, Validate)]
pub struct CacheConfig {
    /// Maximum number of cached secrets kept before the least recently used is evicted
    pub max_cache_size: usize,

    /// Nanoseconds a secret's metadata is considered fresh.
    ///
    /// Zero selects the one hour default. Negative values are accepted here and
    /// rejected by every refresh with [`SecretCacheError::InvalidConfig`].
    #[validate(range(min = 0, message = "Cache item TTL cannot be negative"))]
    pub cache_item_ttl: i64,

    /// Version stage used when a read does not name one
    #[validate(length(max = 256, message = "Version stage must be at most 256 characters"))]
    pub version_stage: String,

    /// Transform applied to payloads on their way into and out of the cache
    pub hook: Option<Arc<dyn CacheHook>>,

    /// Seed for the refresh jitter generator; entropy-seeded when unset
    pub jitter_seed: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            cache_item_ttl: DEFAULT_CACHE_ITEM_TTL,
            version_stage: DEFAULT_VERSION_STAGE.to_string(),
            hook: None,
            jitter_seed: None,
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max_cache_size", &self.max_cache_size)
            .field("cache_item_ttl", &self.cache_item_ttl)
            .field("version_stage", &self.version_stage)
            .field("hook", &self.hook.as_ref().map(|_| "<hook>"))
            .field("jitter_seed", &self.jitter_seed)
            .finish()
    }
}

impl CacheConfig {
    /// Set the maximum number of cached secrets.
    pub fn with_max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    /// Set the metadata TTL in nanoseconds.
    pub fn with_cache_item_ttl(mut self, cache_item_ttl: i64) -> Self {
        self.cache_item_ttl = cache_item_ttl;
        self
    }

    /// Set the metadata TTL from a [`Duration`], saturating at `i64::MAX` nanoseconds.
    pub fn with_cache_item_ttl_duration(self, ttl: Duration) -> Self {
        let nanos = i64::try_from(ttl.as_nanos()).unwrap_or(i64::MAX);
        self.with_cache_item_ttl(nanos)
    }

    /// Set the default version stage.
    pub fn with_version_stage(mut self, version_stage: impl Into<String>) -> Self {
        self.version_stage = version_stage.into();
        self
    }

    /// Install a cache hook.
    pub fn with_hook(mut self, hook: Arc<dyn CacheHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Seed the refresh jitter generator.
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Stage to use for a read that asked for `requested`.
    ///
    /// Falls back to the configured stage, then to [`DEFAULT_VERSION_STAGE`].
    pub fn resolve_stage<'a>(&'a self, requested: &'a str) -> &'a str {
        if !requested.is_empty() {
            requested
        } else if !self.version_stage.is_empty() {
            &self.version_stage
        } else {
            DEFAULT_VERSION_STAGE
        }
    }

    /// Validate the configuration up front.
    ///
    /// The cache itself does not call this; a negative TTL surfaces from the
    /// first refresh instead.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(|e| SecretCacheError::invalid_config(e.to_string()))
    }

    /// Create configuration from environment variables.
    ///
    /// - `SECRETCACHE_MAX_CACHE_SIZE`
    /// - `SECRETCACHE_CACHE_ITEM_TTL_NANOS`
    /// - `SECRETCACHE_VERSION_STAGE`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let max_cache_size = match std::env::var("SECRETCACHE_MAX_CACHE_SIZE") {
            Ok(value) => value.parse::<usize>().map_err(|e| {
                SecretCacheError::invalid_config(format!("Invalid max cache size: {}", e))
            })?,
            Err(_) => defaults.max_cache_size,
        };

        let cache_item_ttl = match std::env::var("SECRETCACHE_CACHE_ITEM_TTL_NANOS") {
            Ok(value) => value.parse::<i64>().map_err(|e| {
                SecretCacheError::invalid_config(format!("Invalid cache item TTL: {}", e))
            })?,
            Err(_) => defaults.cache_item_ttl,
        };

        let version_stage =
            std::env::var("SECRETCACHE_VERSION_STAGE").unwrap_or(defaults.version_stage);

        Ok(Self { max_cache_size, cache_item_ttl, version_stage, ..Self::default() })
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable cache metrics through the `metrics` facade
    pub enable_metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { enable_metrics: true, log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let enable_metrics = std::env::var("SECRETCACHE_ENABLE_METRICS")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        let log_level = std::env::var("SECRETCACHE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let json_logging = std::env::var("SECRETCACHE_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { enable_metrics, log_level, json_logging }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config_validation() {
        let config = CacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_cache_size, 1024);
        assert_eq!(config.cache_item_ttl, 3_600_000_000_000);
        assert_eq!(config.version_stage, "AWSCURRENT");
        assert!(config.hook.is_none());
    }

    #[test]
    fn test_negative_ttl_fails_validation() {
        let config = CacheConfig::default().with_cache_item_ttl(-1);
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_ttl_from_duration() {
        let config = CacheConfig::default().with_cache_item_ttl_duration(Duration::from_secs(2));
        assert_eq!(config.cache_item_ttl, 2_000_000_000);

        let config = CacheConfig::default().with_cache_item_ttl_duration(Duration::MAX);
        assert_eq!(config.cache_item_ttl, i64::MAX);
    }

    #[test]
    fn test_resolve_stage() {
        let config = CacheConfig::default();
        assert_eq!(config.resolve_stage("AWSPREVIOUS"), "AWSPREVIOUS");
        assert_eq!(config.resolve_stage(""), "AWSCURRENT");

        let config = CacheConfig::default().with_version_stage("custom");
        assert_eq!(config.resolve_stage(""), "custom");

        let config = CacheConfig::default().with_version_stage("");
        assert_eq!(config.resolve_stage(""), "AWSCURRENT");
    }

    #[test]
    fn test_debug_hides_hook() {
        let debug_output = format!("{:?}", CacheConfig::default());
        assert!(debug_output.contains("max_cache_size: 1024"));
        assert!(debug_output.contains("hook: None"));
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("SECRETCACHE_MAX_CACHE_SIZE", "16");
        env::set_var("SECRETCACHE_CACHE_ITEM_TTL_NANOS", "5000");
        env::set_var("SECRETCACHE_VERSION_STAGE", "AWSPENDING");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.max_cache_size, 16);
        assert_eq!(config.cache_item_ttl, 5000);
        assert_eq!(config.version_stage, "AWSPENDING");

        env::set_var("SECRETCACHE_MAX_CACHE_SIZE", "lots");
        let err = CacheConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("Invalid max cache size"));

        env::remove_var("SECRETCACHE_MAX_CACHE_SIZE");
        env::remove_var("SECRETCACHE_CACHE_ITEM_TTL_NANOS");
        env::remove_var("SECRETCACHE_VERSION_STAGE");
    }

    #[test]
    fn test_observability_defaults() {
        let config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logging);
    }
}
