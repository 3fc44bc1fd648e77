//! # secretcache
//!
//! In-process read-through cache for secrets held in a remote secrets manager.
//!
//! Reads are served from memory and refreshed on demand: secret metadata
//! (which stage points at which version) expires on a jittered TTL, and each
//! version payload is fetched once. Failed refreshes back off exponentially
//! while readers keep receiving the last good value, or the recorded error when
//! there is none.
//!
//! ## Architecture
//!
//! ```text
//! SecretCache → secret item (metadata) → version entry (payload)
//!      ↓                ↓                        ↓
//!   LruCache      SecretsManagerClient::describe_secret / get_secret_value
//! ```
//!
//! ## Core Components
//!
//! - **Cache**: [`SecretCache`] facade, LRU containers, refresh state, hooks
//! - **Secrets**: the [`SecretsManagerClient`] seam plus in-memory and
//!   environment-variable implementations
//! - **Configuration**: [`CacheConfig`] defaults, environment loading, validation
//! - **Observability**: `tracing` subscriber setup and `metrics` counters
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use secretcache::{CacheConfig, EnvVarSecretsClient, Result, SecretCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     secretcache::observability::init_logging("info", false)?;
//!
//!     let cache = SecretCache::builder()
//!         .client(Arc::new(EnvVarSecretsClient::new()))
//!         .config(CacheConfig::from_env()?)
//!         .build()?;
//!
//!     let password = cache.get_secret_string("db-password").await?;
//!     println!("password has {} characters", password.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use cache::{
    CacheHook, CachePayload, Clock, LruCache, ManualClock, NoopHook, SecretCache,
    SecretCacheBuilder, SystemClock,
};
pub use config::{CacheConfig, ObservabilityConfig};
pub use errors::{Result, SecretCacheError};
pub use secrets::{
    EnvVarSecretsClient, InMemorySecretsClient, SecretDescription, SecretString, SecretValue,
    SecretsManagerClient,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// User agent suffix client implementations can attach to backend requests.
pub fn user_agent() -> String {
    format!("SecretCache/{}", VERSION)
}
