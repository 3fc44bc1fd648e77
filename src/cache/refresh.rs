//! Refresh bookkeeping shared by secret and version entries.
//!
//! Each entry owns a [`RefreshState`] and consults it before every read. A
//! failed refresh is remembered together with the earliest time a retry is
//! allowed, so readers during an outage reuse the recorded error instead of
//! calling the backend again.

use std::time::Duration;

use crate::errors::SecretCacheError;

/// First backoff step, in seconds.
pub const BACKOFF_BASE_SECS: u64 = 1;

/// Multiplier applied per consecutive failure.
pub const BACKOFF_GROWTH_FACTOR: u64 = 2;

/// Upper bound on the backoff delay, in seconds.
pub const BACKOFF_MAX_SECS: u64 = 3600;

/// Delay before retrying after `error_count` consecutive failures.
///
/// `min(base * growth^error_count, max)` seconds.
pub fn backoff_delay(error_count: u32) -> Duration {
    let secs = BACKOFF_GROWTH_FACTOR
        .checked_pow(error_count)
        .and_then(|factor| factor.checked_mul(BACKOFF_BASE_SECS))
        .map_or(BACKOFF_MAX_SECS, |secs| secs.min(BACKOFF_MAX_SECS));
    Duration::from_secs(secs)
}

/// Staleness and error state of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshState {
    refresh_needed: bool,
    error: Option<SecretCacheError>,
    error_count: u32,
    next_retry_time: i64,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self { refresh_needed: true, error: None, error_count: 0, next_retry_time: 0 }
    }
}

impl RefreshState {
    /// A state that asks for a refresh on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a read at `now` (nanoseconds) must refresh first.
    pub fn is_refresh_needed(&self, now: i64) -> bool {
        if self.refresh_needed {
            return true;
        }
        if self.error.is_none() {
            return false;
        }
        if self.next_retry_time == 0 {
            return true;
        }
        self.next_retry_time <= now
    }

    /// Clear the refresh flag at the start of an attempt.
    pub fn begin_refresh(&mut self) {
        self.refresh_needed = false;
    }

    /// Force the next read to refresh.
    pub fn mark_refresh_needed(&mut self) {
        self.refresh_needed = true;
    }

    /// Record a successful refresh.
    pub fn record_success(&mut self) {
        self.error = None;
        self.error_count = 0;
        self.next_retry_time = 0;
    }

    /// Record a failed refresh at `now` and schedule the next retry.
    pub fn record_failure(&mut self, error: SecretCacheError, now: i64) {
        self.error_count = self.error_count.saturating_add(1);
        self.error = Some(error);
        let delay = i64::try_from(backoff_delay(self.error_count).as_nanos()).unwrap_or(i64::MAX);
        self.next_retry_time = now.saturating_add(delay);
    }

    /// Error from the most recent refresh, if it failed.
    pub fn error(&self) -> Option<&SecretCacheError> {
        self.error.as_ref()
    }

    /// Consecutive failed refreshes.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Earliest retry time in nanoseconds, zero when none is scheduled.
    pub fn next_retry_time(&self) -> i64 {
        self.next_retry_time
    }
}
