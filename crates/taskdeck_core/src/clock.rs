//! Time sources for lifecycle stamping.
//!
//! # Invariants
//! - `SystemClock` readings are strictly increasing within one process, so
//!   two mutations in the same millisecond still get distinct `updated_at`.
//! - `ManualClock` only moves when told to, except that `now_ms` advances by
//!   the configured step after every reading.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of epoch-millisecond timestamps.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock with a strictly monotonic guarantee.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        let wall = wall_clock_ms();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(previous + 1);
            match self
                .last
                .compare_exchange_weak(previous, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Deterministic clock for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    current: AtomicI64,
    step: i64,
}

impl ManualClock {
    /// Starts at `start_ms` and advances by `step_ms` after each reading.
    pub fn new(start_ms: i64, step_ms: i64) -> Self {
        Self {
            current: AtomicI64::new(start_ms),
            step: step_ms,
        }
    }

    pub fn set(&self, value_ms: i64) {
        self.current.store(value_ms, Ordering::SeqCst);
    }

    /// Returns the next value `now_ms` would hand out.
    pub fn peek(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.current.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock, SystemClock};

    #[test]
    fn system_clock_is_strictly_increasing() {
        let clock = SystemClock::new();
        let mut previous = clock.now_ms();
        for _ in 0..1_000 {
            let next = clock.now_ms();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn manual_clock_steps_after_each_reading() {
        let clock = ManualClock::new(100, 5);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.now_ms(), 105);
        clock.set(1_000);
        assert_eq!(clock.peek(), 1_000);
        assert_eq!(clock.now_ms(), 1_000);
    }
}
