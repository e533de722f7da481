//! Timestamps and the clock abstraction.
//!
//! Timestamps are Unix epoch seconds (UTC). Components that age data out
//! (cache entries, status records) read time through [`Clock`] so tests can
//! drive expiry deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Whole seconds since the Unix epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Read the system clock. A clock set before 1970 reads as zero.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_secs()))
            .unwrap_or(Self(0))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// `self - window`, clamped at zero. Used to compute eviction cutoffs.
    pub fn before(&self, window: Duration) -> Self {
        Self(self.0.saturating_sub(window.as_secs()))
    }

    /// True once `ttl` has fully elapsed between `self` and `now`.
    pub fn has_expired(&self, ttl: Duration, now: Timestamp) -> bool {
        now.0.saturating_sub(self.0) >= ttl.as_secs()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
