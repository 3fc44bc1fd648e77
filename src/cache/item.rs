//! Cache entry for one secret: stage metadata plus its version sub-cache.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::hook::CachePayload;
use super::lru::LruCache;
use super::refresh::RefreshState;
use super::version::SecretCacheVersion;
use super::CacheShared;
use crate::config::{DEFAULT_CACHE_ITEM_TTL, DEFAULT_VERSION_CACHE_SIZE};
use crate::errors::{Result, SecretCacheError};
use crate::observability::CacheMetrics;
use crate::secrets::{SecretDescription, SecretValue};

#[derive(Debug)]
struct ItemState {
    refresh: RefreshState,
    payload: Option<CachePayload>,
    next_refresh_time: i64,
    rng: StdRng,
}

impl ItemState {
    fn is_refresh_needed(&self, now: i64) -> bool {
        self.refresh.is_refresh_needed(now) || now >= self.next_refresh_time
    }
}

/// Metadata for one secret and the versions read through it.
pub(crate) struct SecretCacheItem {
    secret_id: String,
    shared: Arc<CacheShared>,
    versions: LruCache<String, Arc<SecretCacheVersion>>,
    state: Mutex<ItemState>,
}

impl SecretCacheItem {
    /// Build an entry that refreshes on first read. No backend call is made here.
    pub(crate) fn new(secret_id: impl Into<String>, shared: Arc<CacheShared>) -> Self {
        let rng = match shared.config.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = ItemState {
            refresh: RefreshState::new(),
            payload: None,
            next_refresh_time: shared.clock.now_nanos(),
            rng,
        };

        Self {
            secret_id: secret_id.into(),
            versions: LruCache::with_layer(DEFAULT_VERSION_CACHE_SIZE, "version"),
            shared,
            state: Mutex::new(state),
        }
    }

    pub(crate) fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Force the next read to fetch fresh metadata.
    ///
    /// Cached metadata, versions, and error state stay as they are until that read.
    pub(crate) async fn mark_refresh_needed(&self) {
        self.state.lock().await.refresh.mark_refresh_needed();
    }

    /// Read the value `stage` points at, refreshing metadata and version as due.
    ///
    /// An empty `stage` falls back to the configured default stage.
    pub(crate) async fn get_secret_value(&self, stage: &str) -> Result<SecretValue> {
        let stage = self.shared.config.resolve_stage(stage);

        let version = {
            let mut state = self.state.lock().await;
            self.refresh(&mut state).await;

            match self.version_id_for_stage(&state, stage) {
                Some(version_id) => self.get_version(&version_id),
                None => {
                    return Err(state
                        .refresh
                        .error()
                        .cloned()
                        .unwrap_or_else(|| SecretCacheError::version_not_found(stage)));
                }
            }
        };

        match version.get_secret_value().await {
            (Some(value), _) => Ok(value),
            (None, Some(err)) => Err(err),
            (None, None) => Err(SecretCacheError::invalid_operation(format!(
                "secret {} version {} holds no value",
                self.secret_id,
                version.version_id()
            ))),
        }
    }

    async fn refresh(&self, state: &mut ItemState) {
        let now = self.shared.clock.now_nanos();
        if !state.is_refresh_needed(now) {
            return;
        }
        state.refresh.begin_refresh();

        let ttl = match self.effective_ttl() {
            Ok(ttl) => ttl,
            Err(err) => {
                warn!(secret_id = %self.secret_id, error = %err, "Refusing to refresh secret");
                state.refresh.record_failure(err, now);
                CacheMetrics::record_refresh("secret", false);
                return;
            }
        };

        let result = self.shared.client.describe_secret(&self.secret_id).await;

        let now = self.shared.clock.now_nanos();
        let delay = Self::jitter(&mut state.rng, ttl);
        state.next_refresh_time = now.saturating_add(delay);

        match result {
            Ok(description) => {
                debug!(
                    secret_id = %self.secret_id,
                    versions = description.version_ids_to_stages.len(),
                    next_refresh_in_ns = delay,
                    "Refreshed secret metadata"
                );
                state.payload = Some(self.shared.hook.put(CachePayload::Description(description)));
                state.refresh.record_success();
                CacheMetrics::record_refresh("secret", true);
            }
            Err(err) => {
                state.refresh.record_failure(err, now);
                warn!(
                    secret_id = %self.secret_id,
                    error_count = state.refresh.error_count(),
                    next_retry_time = state.refresh.next_retry_time(),
                    error = ?state.refresh.error(),
                    "Failed to refresh secret metadata"
                );
                CacheMetrics::record_refresh("secret", false);
            }
        }
    }

    fn effective_ttl(&self) -> Result<i64> {
        match self.shared.config.cache_item_ttl {
            ttl if ttl < 0 => {
                Err(SecretCacheError::invalid_config("cannot set negative ttl on cache"))
            }
            0 => Ok(DEFAULT_CACHE_ITEM_TTL),
            ttl => Ok(ttl),
        }
    }

    /// Uniform in `[ttl / 2, ttl)`, or `ttl` itself when that range is empty.
    fn jitter(rng: &mut StdRng, ttl: i64) -> i64 {
        if ttl >= 2 {
            rng.gen_range(ttl / 2..ttl)
        } else {
            ttl
        }
    }

    fn version_id_for_stage(&self, state: &ItemState, stage: &str) -> Option<String> {
        let description = self.decode(state.payload.clone()?)?;
        if description.version_ids_to_stages.is_empty() {
            return None;
        }
        description.version_id_for_stage(stage).map(str::to_string)
    }

    fn decode(&self, payload: CachePayload) -> Option<SecretDescription> {
        let description = self.shared.hook.get(payload).into_description();
        if description.is_none() {
            warn!(secret_id = %self.secret_id, "Cache hook returned a version payload for metadata");
        }
        description
    }

    fn get_version(&self, version_id: &str) -> Arc<SecretCacheVersion> {
        if let Some(version) = self.versions.get(version_id) {
            CacheMetrics::record_lookup("version", "hit");
            return version;
        }
        CacheMetrics::record_lookup("version", "miss");

        let candidate =
            Arc::new(SecretCacheVersion::new(&self.secret_id, version_id, self.shared.clone()));
        self.versions.put_if_absent(version_id.to_string(), candidate.clone());
        self.versions.get(version_id).unwrap_or(candidate)
    }

    #[cfg(test)]
    async fn next_refresh_time(&self) -> i64 {
        self.state.lock().await.next_refresh_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::test_support::shared_with;
    use crate::config::CacheConfig;
    use crate::secrets::InMemorySecretsClient;

    fn client_with_secret() -> Arc<InMemorySecretsClient> {
        let client = Arc::new(InMemorySecretsClient::new());
        client.put_secret_string("db", "v1", ["AWSPREVIOUS"], "old");
        client.put_secret_string("db", "v2", ["AWSCURRENT"], "new");
        client
    }

    fn expose(value: &SecretValue) -> &str {
        value.secret_string.as_ref().map(|s| s.expose_secret()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_resolves_stages() {
        let client = client_with_secret();
        let clock = Arc::new(ManualClock::new(0));
        let item = SecretCacheItem::new("db", shared_with(client.clone(), clock, CacheConfig::default()));

        assert_eq!(expose(&item.get_secret_value("").await.unwrap()), "new");
        assert_eq!(expose(&item.get_secret_value("AWSPREVIOUS").await.unwrap()), "old");
        assert_eq!(client.describe_calls(), 1);
        assert_eq!(client.get_value_calls(), 2);
        assert_eq!(item.versions.len(), 2);
        assert_eq!(item.secret_id(), "db");
    }

    #[tokio::test]
    async fn test_unknown_stage_is_version_not_found() {
        let client = client_with_secret();
        let clock = Arc::new(ManualClock::new(0));
        let item = SecretCacheItem::new("db", shared_with(client, clock, CacheConfig::default()));

        let err = item.get_secret_value("AWSPENDING").await.unwrap_err();
        assert_eq!(err, SecretCacheError::version_not_found("AWSPENDING"));
    }

    #[tokio::test]
    async fn test_negative_ttl_fails_before_describe() {
        let client = client_with_secret();
        let clock = Arc::new(ManualClock::new(0));
        let config = CacheConfig::default().with_cache_item_ttl(-1);
        let item = SecretCacheItem::new("db", shared_with(client.clone(), clock, config));

        for _ in 0..3 {
            let err = item.get_secret_value("").await.unwrap_err();
            assert!(err.is_config_error());
        }
        assert_eq!(client.describe_calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_uses_default() {
        let client = client_with_secret();
        let clock = Arc::new(ManualClock::new(1_000));
        let config = CacheConfig::default().with_cache_item_ttl(0).with_jitter_seed(7);
        let item = SecretCacheItem::new("db", shared_with(client, clock, config));

        item.get_secret_value("").await.unwrap();
        let next = item.next_refresh_time().await - 1_000;
        assert!(next >= DEFAULT_CACHE_ITEM_TTL / 2);
        assert!(next < DEFAULT_CACHE_ITEM_TTL);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let delay = SecretCacheItem::jitter(&mut rng, 100);
            assert!((50..100).contains(&delay));
        }
        assert_eq!(SecretCacheItem::jitter(&mut rng, 1), 1);
    }

    #[tokio::test]
    async fn test_refreshes_after_ttl() {
        let client = client_with_secret();
        let clock = Arc::new(ManualClock::new(0));
        let config = CacheConfig::default().with_cache_item_ttl(1_000);
        let item = SecretCacheItem::new("db", shared_with(client.clone(), clock.clone(), config));

        item.get_secret_value("").await.unwrap();
        clock.advance_nanos(499);
        item.get_secret_value("").await.unwrap();
        assert_eq!(client.describe_calls(), 1);

        clock.advance_nanos(501);
        item.get_secret_value("").await.unwrap();
        assert_eq!(client.describe_calls(), 2);
        // The version itself never changed, so it is not fetched again.
        assert_eq!(client.get_value_calls(), 1);
    }

    #[tokio::test]
    async fn test_mark_refresh_needed() {
        let client = client_with_secret();
        let clock = Arc::new(ManualClock::new(0));
        let item = SecretCacheItem::new("db", shared_with(client.clone(), clock, CacheConfig::default()));

        item.get_secret_value("").await.unwrap();
        item.mark_refresh_needed().await;
        assert_eq!(client.describe_calls(), 1);

        item.get_secret_value("").await.unwrap();
        assert_eq!(client.describe_calls(), 2);
    }

    #[tokio::test]
    async fn test_describe_error_is_returned_without_metadata() {
        let client = client_with_secret();
        client.fail_describe(Some(SecretCacheError::backend("throttled")));
        let clock = Arc::new(ManualClock::new(0));
        let item = SecretCacheItem::new("db", shared_with(client.clone(), clock, CacheConfig::default()));

        for _ in 0..10 {
            let err = item.get_secret_value("").await.unwrap_err();
            assert_eq!(err, SecretCacheError::backend("throttled"));
        }
        assert_eq!(client.describe_calls(), 1);
    }
}
