//! Common test utilities for all integration tests.
//!
//! Provides seeded in-memory backends, cache construction helpers, and hooks
//! that record or transform what passes through them.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use secretcache::{
    CacheConfig, CacheHook, CachePayload, InMemorySecretsClient, ManualClock, SecretCache,
    SecretDescription, SecretString, SecretValue,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const STRING_SECRET: &str = "string-secret";
pub const BINARY_SECRET: &str = "binary-secret";
pub const STRING_VALUE: &str = "hello world";
pub const BINARY_VALUE: &[u8] = &[0xde, 0xad, 0xbe, 0xef];

/// Backend holding one text secret and one binary secret, both at `AWSCURRENT`.
pub fn seeded_client() -> Arc<InMemorySecretsClient> {
    let client = Arc::new(InMemorySecretsClient::new());
    client.put_secret_string(STRING_SECRET, "v1", ["AWSCURRENT"], STRING_VALUE);
    client.put_secret_binary(BINARY_SECRET, "b1", ["AWSCURRENT"], BINARY_VALUE);
    client
}

/// Cache over `client` driven by a manual clock starting at zero.
pub fn manual_cache(
    client: &Arc<InMemorySecretsClient>,
    config: CacheConfig,
) -> (SecretCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let cache = SecretCache::builder()
        .client(client.clone())
        .config(config)
        .clock(clock.clone())
        .build()
        .expect("client is set");
    (cache, clock)
}

/// Hook that counts its calls and passes payloads through.
#[derive(Debug, Default)]
pub struct CountingHook {
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl CountingHook {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl CacheHook for CountingHook {
    fn put(&self, payload: CachePayload) -> CachePayload {
        self.puts.fetch_add(1, Ordering::SeqCst);
        payload
    }

    fn get(&self, payload: CachePayload) -> CachePayload {
        self.gets.fetch_add(1, Ordering::SeqCst);
        payload
    }
}

/// Hook that scrambles stored values and restores them on the way out.
#[derive(Debug, Default)]
pub struct ScramblingHook;

impl ScramblingHook {
    fn scramble(mut value: SecretValue) -> SecretValue {
        if let Some(text) = value.secret_string.take() {
            let reversed: String = text.expose_secret().chars().rev().collect();
            value.secret_string = Some(SecretString::new(reversed));
        }
        if let Some(bytes) = value.secret_binary.as_mut() {
            bytes.iter_mut().for_each(|b| *b ^= 0x5a);
        }
        value
    }
}

impl CacheHook for ScramblingHook {
    fn put(&self, payload: CachePayload) -> CachePayload {
        match payload {
            CachePayload::Value(value) => CachePayload::Value(Self::scramble(value)),
            other => other,
        }
    }

    fn get(&self, payload: CachePayload) -> CachePayload {
        // Both transforms are involutions.
        self.put(payload)
    }
}

/// Hook that hands back metadata where a version value was stored.
#[derive(Debug, Default)]
pub struct MismatchedHook;

impl CacheHook for MismatchedHook {
    fn put(&self, payload: CachePayload) -> CachePayload {
        payload
    }

    fn get(&self, payload: CachePayload) -> CachePayload {
        match payload {
            CachePayload::Value(_) => CachePayload::Description(SecretDescription::default()),
            other => other,
        }
    }
}
