//! Cache entry for one version of a secret.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::hook::CachePayload;
use super::refresh::RefreshState;
use super::CacheShared;
use crate::errors::SecretCacheError;
use crate::observability::CacheMetrics;
use crate::secrets::SecretValue;

#[derive(Debug, Default)]
struct VersionState {
    refresh: RefreshState,
    payload: Option<CachePayload>,
}

/// Payload of one `(secret, version)` pair.
///
/// The version is immutable on the backend, so after the first successful
/// fetch the entry only refreshes again to recover from an error.
pub(crate) struct SecretCacheVersion {
    secret_id: String,
    version_id: String,
    shared: Arc<CacheShared>,
    state: Mutex<VersionState>,
}

impl SecretCacheVersion {
    /// Build an entry. Nothing is fetched until the first read.
    pub(crate) fn new(
        secret_id: impl Into<String>,
        version_id: impl Into<String>,
        shared: Arc<CacheShared>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            version_id: version_id.into(),
            shared,
            state: Mutex::new(VersionState::default()),
        }
    }

    pub(crate) fn version_id(&self) -> &str {
        &self.version_id
    }

    /// Refresh if due, then return the cached value with the last refresh error.
    ///
    /// Both may be present: a value fetched earlier survives a later failed
    /// refresh, and the caller picks which one to honour.
    pub(crate) async fn get_secret_value(
        &self,
    ) -> (Option<SecretValue>, Option<SecretCacheError>) {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await;

        let value = state.payload.clone().and_then(|payload| self.decode(payload));
        (value, state.refresh.error().cloned())
    }

    async fn refresh(&self, state: &mut VersionState) {
        if !state.refresh.is_refresh_needed(self.shared.clock.now_nanos()) {
            return;
        }
        state.refresh.begin_refresh();

        let result = self.shared.client.get_secret_value(&self.secret_id, &self.version_id).await;
        match result {
            Ok(value) => {
                debug!(
                    secret_id = %self.secret_id,
                    version_id = %self.version_id,
                    "Refreshed secret version"
                );
                state.payload = Some(self.shared.hook.put(CachePayload::Value(value)));
                state.refresh.record_success();
                CacheMetrics::record_refresh("version", true);
            }
            Err(err) => {
                let now = self.shared.clock.now_nanos();
                state.refresh.record_failure(err, now);
                warn!(
                    secret_id = %self.secret_id,
                    version_id = %self.version_id,
                    error_count = state.refresh.error_count(),
                    next_retry_time = state.refresh.next_retry_time(),
                    error = ?state.refresh.error(),
                    "Failed to refresh secret version"
                );
                CacheMetrics::record_refresh("version", false);
            }
        }
    }

    fn decode(&self, payload: CachePayload) -> Option<SecretValue> {
        let value = self.shared.hook.get(payload).into_value();
        if value.is_none() {
            warn!(
                secret_id = %self.secret_id,
                version_id = %self.version_id,
                "Cache hook returned metadata for a version payload"
            );
        }
        value
    }

    #[cfg(test)]
    pub(crate) async fn refresh_state(&self) -> RefreshState {
        self.state.lock().await.refresh.clone()
    }
}
