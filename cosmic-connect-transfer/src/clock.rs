//! Time source for throughput computation

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// Source of wall-clock timestamps
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
///
/// Used for simulated transfers and deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Clock starting at the current system time
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::starting_now();
        let start = clock.now();
        clock.advance_secs(3);
        assert_eq!((clock.now() - start).num_seconds(), 3);

        clock.advance(Duration::milliseconds(500));
        assert_eq!((clock.now() - start).num_seconds(), 3);
    }

    #[test]
    fn test_manual_clock_can_move_backwards() {
        let clock = ManualClock::starting_now();
        let start = clock.now();
        clock.set(start - Duration::seconds(10));
        assert!(clock.now() < start);
    }
}
