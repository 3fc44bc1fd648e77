//! Injectable time source.
//!
//! Refresh scheduling works on nanoseconds since the Unix epoch. Tests swap the
//! wall clock for a [`ManualClock`] to expire TTLs and backoff windows without
//! sleeping.

use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current time in nanoseconds since the Unix epoch.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `now_nanos`.
    pub fn new(now_nanos: i64) -> Self {
        Self { now: AtomicI64::new(now_nanos) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let nanos = i64::try_from(by.as_nanos()).unwrap_or(i64::MAX);
        self.advance_nanos(nanos);
    }

    /// Move the clock forward by a raw number of nanoseconds.
    pub fn advance_nanos(&self, nanos: i64) {
        // fetch_update never fails with a closure that always returns Some
        let _ = self.now.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
            Some(now.saturating_add(nanos))
        });
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_nanos: i64) {
        self.now.store(now_nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
