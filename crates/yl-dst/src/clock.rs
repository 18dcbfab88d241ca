//! Deterministic simulated time.
//!
//! Time only advances when something asks it to. Backoff waits in DST runs
//! advance this clock instead of sleeping, so a run with many retries still
//! finishes instantly and its timing is reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Simulated clock with millisecond precision.
///
/// Uses atomics so it can be shared (behind an `Arc`) between the simulated
/// generator and the simulated sleeper.
pub struct SimClock {
    /// Current time in milliseconds since the start of the run
    now_ms: AtomicU64,
    /// Number of times `sleep` was called
    sleeps_count: AtomicU64,
}

/// Bounds for time operations.
const TIME_MS_MAX: u64 = u64::MAX / 2;

impl SimClock {
    /// Create a new clock starting at time 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_ms: AtomicU64::new(0),
            sleeps_count: AtomicU64::new(0),
        }
    }

    /// Current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Acquire)
    }

    /// Current time as a `Duration` since the start of the run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.now_ms())
    }

    /// Advance time by the given number of milliseconds.
    pub fn advance_ms(&self, delta_ms: u64) {
        let current = self.now_ms.load(Ordering::Acquire);
        debug_assert!(
            current <= TIME_MS_MAX - delta_ms,
            "Time advance would overflow"
        );

        self.now_ms.fetch_add(delta_ms, Ordering::Release);
    }

    /// Simulate a sleep by advancing time.
    ///
    /// Returns immediately. Sub-millisecond remainders are dropped.
    pub fn sleep(&self, duration: Duration) {
        self.sleeps_count.fetch_add(1, Ordering::Relaxed);
        let delta_ms = u64::try_from(duration.as_millis()).unwrap_or(TIME_MS_MAX);
        if delta_ms > 0 {
            self.advance_ms(delta_ms);
        }
    }

    /// Number of simulated sleeps so far.
    #[must_use]
    pub fn sleeps_count(&self) -> u64 {
        self.sleeps_count.load(Ordering::Relaxed)
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
