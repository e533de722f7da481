//! Manually driven clock.

use attestor_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// Clock that reads a shared counter of seconds. Tests move it explicitly
/// with [`advance`](Self::advance) or [`set`](Self::set).
#[derive(Debug)]
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
        }
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute reading, possibly backwards.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }
}
