//! Time source shared by strategies and the in-memory provider

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at the given epoch milliseconds
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Jump to an absolute time
    pub fn set_millis(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
