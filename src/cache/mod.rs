//! # Secret Cache
//!
//! Read-through cache in front of a [`SecretsManagerClient`].
//!
//! Two layers of entries sit behind the [`SecretCache`] facade:
//!
//! ```text
//! SecretCache ── LruCache<secret id, item> ── item ── LruCache<version id, version>
//! ```
//!
//! The secret-level item refreshes stage metadata on a jittered TTL. Each
//! version entry fetches its payload once and afterwards only refreshes to
//! recover from an error. All refresh work happens on the reading task; there
//! are no background tasks.
//!
//! Locking: every container and every entry has its own lock, and a read never
//! holds two of them at once. Concurrent readers of one entry share a single
//! in-flight refresh.

pub mod clock;
pub mod hook;
pub mod lru;
pub mod refresh;

mod item;
mod version;

pub use clock::{Clock, ManualClock, SystemClock};
pub use hook::{CacheHook, CachePayload, NoopHook};
pub use lru::LruCache;
pub use refresh::RefreshState;

use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::CacheConfig;
use crate::errors::{Result, SecretCacheError};
use crate::observability::{log_config_info, CacheMetrics};
use crate::secrets::{SecretString, SecretsManagerClient};
use item::SecretCacheItem;

/// Collaborators shared by every entry of one cache.
pub(crate) struct CacheShared {
    pub(crate) config: CacheConfig,
    pub(crate) client: Arc<dyn SecretsManagerClient>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hook: Arc<dyn CacheHook>,
}

impl CacheShared {
    pub(crate) fn new(
        config: CacheConfig,
        client: Arc<dyn SecretsManagerClient>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let hook = config.hook.clone().unwrap_or_else(|| Arc::new(NoopHook));
        Arc::new(Self { config, client, clock, hook })
    }
}

/// In-process cache of secrets.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use secretcache::{InMemorySecretsClient, SecretCache};
///
/// # #[tokio::main]
/// # async fn main() -> secretcache::Result<()> {
/// let client = Arc::new(InMemorySecretsClient::new());
/// client.put_secret_string("db-password", "v1", ["AWSCURRENT"], "hunter2");
///
/// let cache = SecretCache::new(client.clone());
/// let password = cache.get_secret_string("db-password").await?;
/// assert_eq!(password.expose_secret(), "hunter2");
///
/// // Served from memory.
/// cache.get_secret_string("db-password").await?;
/// assert_eq!(client.describe_calls(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SecretCache {
    shared: Arc<CacheShared>,
    secrets: LruCache<String, Arc<SecretCacheItem>>,
}

impl fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCache")
            .field("config", &self.shared.config)
            .field("clock", &self.shared.clock)
            .field("cached_secrets", &self.secrets.len())
            .finish()
    }
}

impl SecretCache {
    /// Cache with default configuration and the wall clock.
    pub fn new(client: Arc<dyn SecretsManagerClient>) -> Self {
        Self::with_config(client, CacheConfig::default())
    }

    /// Cache with the given configuration and the wall clock.
    pub fn with_config(client: Arc<dyn SecretsManagerClient>, config: CacheConfig) -> Self {
        Self::from_parts(config, client, Arc::new(SystemClock))
    }

    pub fn builder() -> SecretCacheBuilder {
        SecretCacheBuilder::default()
    }

    fn from_parts(
        config: CacheConfig,
        client: Arc<dyn SecretsManagerClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        log_config_info(&config);
        let secrets = LruCache::with_layer(config.max_cache_size, "secret");
        Self { shared: CacheShared::new(config, client, clock), secrets }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Number of secrets currently cached.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Text value of the secret at the default stage.
    pub async fn get_secret_string(&self, secret_id: &str) -> Result<SecretString> {
        self.get_secret_string_with_stage(secret_id, "").await
    }

    /// Text value of the secret at `version_stage`.
    ///
    /// Fails with [`SecretCacheError::InvalidOperation`] when the version only
    /// holds binary data.
    pub async fn get_secret_string_with_stage(
        &self,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<SecretString> {
        let mut value = self.get_or_create(secret_id).get_secret_value(version_stage).await?;
        value.secret_string.take().ok_or_else(|| {
            SecretCacheError::invalid_operation(format!(
                "secret {} does not hold a string value",
                secret_id
            ))
        })
    }

    /// Binary value of the secret at the default stage.
    pub async fn get_secret_binary(&self, secret_id: &str) -> Result<Vec<u8>> {
        self.get_secret_binary_with_stage(secret_id, "").await
    }

    /// Binary value of the secret at `version_stage`.
    ///
    /// Fails with [`SecretCacheError::InvalidOperation`] when the version only
    /// holds text.
    pub async fn get_secret_binary_with_stage(
        &self,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<Vec<u8>> {
        let mut value = self.get_or_create(secret_id).get_secret_value(version_stage).await?;
        value.secret_binary.take().ok_or_else(|| {
            SecretCacheError::invalid_operation(format!(
                "secret {} does not hold a binary value",
                secret_id
            ))
        })
    }

    /// Text value of the secret at the default stage, parsed as JSON.
    pub async fn get_secret_json<T: DeserializeOwned>(&self, secret_id: &str) -> Result<T> {
        let secret = self.get_secret_string(secret_id).await?;
        Ok(serde_json::from_str(secret.expose_secret())?)
    }

    /// Make the next read of `secret_id` fetch fresh metadata.
    ///
    /// Returns `false` when the secret is not cached, in which case the next
    /// read fetches it anyway.
    pub async fn refresh_now(&self, secret_id: &str) -> bool {
        match self.secrets.get(secret_id) {
            Some(item) => {
                item.mark_refresh_needed().await;
                debug!(secret_id = item.secret_id(), "Secret marked for refresh");
                true
            }
            None => false,
        }
    }

    fn get_or_create(&self, secret_id: &str) -> Arc<SecretCacheItem> {
        if let Some(item) = self.secrets.get(secret_id) {
            CacheMetrics::record_lookup("secret", "hit");
            return item;
        }
        CacheMetrics::record_lookup("secret", "miss");
        debug!(secret_id = %secret_id, "Creating cache entry");

        let candidate = Arc::new(SecretCacheItem::new(secret_id, self.shared.clone()));
        self.secrets.put_if_absent(secret_id.to_string(), candidate.clone());
        // A capacity of zero evicts on insert; the candidate still serves this read.
        self.secrets.get(secret_id).unwrap_or(candidate)
    }
}

/// Builder for [`SecretCache`].
#[derive(Default)]
pub struct SecretCacheBuilder {
    client: Option<Arc<dyn SecretsManagerClient>>,
    config: CacheConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl SecretCacheBuilder {
    /// Backend the cache reads through to. Required.
    pub fn client(mut self, client: Arc<dyn SecretsManagerClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source for TTL and backoff decisions. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<SecretCache> {
        let client = self
            .client
            .ok_or_else(|| SecretCacheError::invalid_config("a secrets manager client is required"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(SecretCache::from_parts(self.config, client, clock))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::InMemorySecretsClient;
    use serde::Deserialize;
    use tracing_test::traced_test;

    fn cache_for(client: &Arc<InMemorySecretsClient>, config: CacheConfig) -> SecretCache {
        SecretCache::builder()
            .client(client.clone())
            .config(config)
            .clock(Arc::new(ManualClock::new(0)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_client() {
        let err = SecretCache::builder().build().unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_entry() {
        let client = Arc::new(InMemorySecretsClient::new());
        let cache = cache_for(&client, CacheConfig::default());

        let first = cache.get_or_create("db");
        let second = cache.get_or_create("db");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_still_serves_reads() {
        let client = Arc::new(InMemorySecretsClient::new());
        client.put_secret_string("db", "v1", ["AWSCURRENT"], "hunter2");
        let cache = cache_for(&client, CacheConfig::default().with_max_cache_size(0));

        for _ in 0..3 {
            let secret = cache.get_secret_string("db").await.unwrap();
            assert_eq!(secret.expose_secret(), "hunter2");
        }
        assert!(cache.is_empty());
        assert_eq!(client.describe_calls(), 3);
    }

    #[tokio::test]
    async fn test_refresh_now_unknown_secret() {
        let client = Arc::new(InMemorySecretsClient::new());
        let cache = cache_for(&client, CacheConfig::default());
        assert!(!cache.refresh_now("missing").await);
    }

    #[tokio::test]
    async fn test_get_secret_json() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Credentials {
            username: String,
            port: u16,
        }

        let client = Arc::new(InMemorySecretsClient::new());
        client.put_secret_string("db", "v1", ["AWSCURRENT"], r#"{"username":"admin","port":5432}"#);
        client.put_secret_string("broken", "v1", ["AWSCURRENT"], "{not json");
        let cache = cache_for(&client, CacheConfig::default());

        let credentials: Credentials = cache.get_secret_json("db").await.unwrap();
        assert_eq!(credentials, Credentials { username: "admin".into(), port: 5432 });

        let err = cache.get_secret_json::<Credentials>("broken").await.unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[tokio::test]
    async fn test_debug_does_not_leak_values() {
        let client = Arc::new(InMemorySecretsClient::new());
        client.put_secret_string("db", "v1", ["AWSCURRENT"], "hunter2");
        let cache = cache_for(&client, CacheConfig::default());
        cache.get_secret_string("db").await.unwrap();

        let debug_output = format!("{:?}", cache);
        assert!(debug_output.contains("cached_secrets: 1"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_refresh_failure_is_logged() {
        let client = Arc::new(InMemorySecretsClient::new());
        client.fail_describe(Some(SecretCacheError::backend("throttled")));
        let cache = cache_for(&client, CacheConfig::default());

        let err = cache.get_secret_string("db").await.unwrap_err();
        assert!(err.is_backend_error());
        assert!(logs_contain("Failed to refresh secret metadata"));
        assert!(logs_contain("throttled"));
        assert!(!logs_contain("hunter2"));
    }
}
