//! In-memory secrets manager client.
//!
//! Holds secrets in a [`DashMap`] and counts every call it receives. Failures
//! can be injected per operation, which makes it the collaborator of choice for
//! exercising the cache's refresh, backoff and stale-on-error behavior without
//! a network.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::client::SecretsManagerClient;
use super::types::{SecretDescription, SecretValue};
use crate::errors::{Result, SecretCacheError};

#[derive(Debug, Default, Clone)]
struct StoredSecret {
    version_ids_to_stages: HashMap<String, Vec<String>>,
    values: HashMap<String, SecretValue>,
}

/// Thread-safe in-memory [`SecretsManagerClient`].
///
/// # Example
///
/// ```rust
/// use secretcache::InMemorySecretsClient;
///
/// let client = InMemorySecretsClient::new();
/// client.put_secret_string("db", "v1", ["AWSCURRENT"], "hunter2");
/// assert_eq!(client.describe_calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySecretsClient {
    secrets: DashMap<String, StoredSecret>,
    describe_error: Mutex<Option<SecretCacheError>>,
    get_value_error: Mutex<Option<SecretCacheError>>,
    describe_calls: AtomicUsize,
    get_value_calls: AtomicUsize,
}

impl InMemorySecretsClient {
    /// Creates an empty client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` as `version_id` of `secret_id` and move `stages` onto it.
    ///
    /// Stages are detached from whichever version held them before, mirroring
    /// how a stage points at exactly one version at a time.
    pub fn put_secret_value<I, S>(&self, secret_id: &str, version_id: &str, stages: I, value: SecretValue)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stages: Vec<String> = stages.into_iter().map(Into::into).collect();
        let mut secret = self.secrets.entry(secret_id.to_string()).or_default();

        for existing in secret.version_ids_to_stages.values_mut() {
            existing.retain(|stage| !stages.contains(stage));
        }
        secret.version_ids_to_stages.insert(version_id.to_string(), stages);
        secret.values.insert(version_id.to_string(), value);
    }

    /// Store a text secret version.
    pub fn put_secret_string<I, S>(&self, secret_id: &str, version_id: &str, stages: I, value: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.put_secret_value(secret_id, version_id, stages, SecretValue::string(value));
    }

    /// Store a binary secret version.
    pub fn put_secret_binary<I, S>(&self, secret_id: &str, version_id: &str, stages: I, value: &[u8])
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.put_secret_value(secret_id, version_id, stages, SecretValue::binary(value.to_vec()));
    }

    /// Register a secret that exists but has no versions.
    pub fn put_empty_secret(&self, secret_id: &str) {
        self.secrets.insert(secret_id.to_string(), StoredSecret::default());
    }

    /// Make every `describe_secret` call fail with `error` (or succeed again with `None`).
    pub fn fail_describe(&self, error: Option<SecretCacheError>) {
        *self.describe_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Make every `get_secret_value` call fail with `error` (or succeed again with `None`).
    pub fn fail_get_value(&self, error: Option<SecretCacheError>) {
        *self.get_value_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Number of `describe_secret` calls received so far.
    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_secret_value` calls received so far.
    pub fn get_value_calls(&self) -> usize {
        self.get_value_calls.load(Ordering::SeqCst)
    }

    fn injected(slot: &Mutex<Option<SecretCacheError>>) -> Result<()> {
        match slot.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SecretsManagerClient for InMemorySecretsClient {
    async fn describe_secret(&self, secret_id: &str) -> Result<SecretDescription> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.describe_error)?;

        let secret =
            self.secrets.get(secret_id).ok_or_else(|| SecretCacheError::secret_not_found(secret_id))?;

        Ok(SecretDescription {
            name: Some(secret_id.to_string()),
            version_ids_to_stages: secret.version_ids_to_stages.clone(),
        })
    }

    async fn get_secret_value(&self, secret_id: &str, version_id: &str) -> Result<SecretValue> {
        self.get_value_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.get_value_error)?;

        let secret =
            self.secrets.get(secret_id).ok_or_else(|| SecretCacheError::secret_not_found(secret_id))?;
        let mut value = secret.values.get(version_id).cloned().ok_or_else(|| {
            SecretCacheError::secret_not_found(format!("{}:{}", secret_id, version_id))
        })?;

        value.name = Some(secret_id.to_string());
        value.version_id = Some(version_id.to_string());
        value.version_stages =
            secret.version_ids_to_stages.get(version_id).cloned().unwrap_or_default();
        Ok(value)
    }
}
