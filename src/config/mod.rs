//! # Configuration Management
//!
//! Cache configuration and its defaults. Everything here is consumed at
//! construction time and read-only afterwards.

pub mod settings;

pub use settings::{CacheConfig, ObservabilityConfig};

/// Default capacity of the top-level secret container.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1024;

/// Default metadata TTL: one hour in nanoseconds.
pub const DEFAULT_CACHE_ITEM_TTL: i64 = 3_600_000_000_000;

/// Stage read when neither the caller nor the configuration names one.
pub const DEFAULT_VERSION_STAGE: &str = "AWSCURRENT";

/// Capacity of each secret's version container.
pub const DEFAULT_VERSION_CACHE_SIZE: usize = 10;
