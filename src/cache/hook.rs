//! Hooks into the in-memory cache.
//!
//! A [`CacheHook`] sees every payload on its way into an entry (`put`) and on
//! its way out (`get`). One use is keeping secrets encrypted while they sit in
//! memory. Secret metadata and version values pass through the hook
//! independently, so a cold read calls each method twice.

use crate::secrets::{SecretDescription, SecretValue};

/// Payload stored on a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePayload {
    /// Secret-level metadata
    Description(SecretDescription),
    /// Value of one secret version
    Value(SecretValue),
}

impl CachePayload {
    /// The metadata, if this payload holds metadata.
    pub fn into_description(self) -> Option<SecretDescription> {
        match self {
            Self::Description(description) => Some(description),
            Self::Value(_) => None,
        }
    }

    /// The version value, if this payload holds one.
    pub fn into_value(self) -> Option<SecretValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::Description(_) => None,
        }
    }
}

/// Transform pair applied when storing to and reading from the cache.
///
/// `get` must undo `put`. A hook that hands back a different payload kind than
/// it received makes the entry behave as if nothing were cached.
pub trait CacheHook: Send + Sync {
    /// Prepare a freshly fetched payload for storage.
    fn put(&self, payload: CachePayload) -> CachePayload;

    /// Recover the payload from its stored form.
    fn get(&self, payload: CachePayload) -> CachePayload;
}

/// Identity hook used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl CacheHook for NoopHook {
    fn put(&self, payload: CachePayload) -> CachePayload {
        payload
    }

    fn get(&self, payload: CachePayload) -> CachePayload {
        payload
    }
}
