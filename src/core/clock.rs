//! Wall-clock and sleep capability, so timing-dependent paths stay testable.

#![allow(missing_docs)]

use std::cell::Cell;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Source of "now" plus the ability to wait.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Real time, real sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated time: sleeping advances the clock instantly.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
    slept: Cell<Duration>,
}

impl ManualClock {
    #[must_use]
    pub const fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
            slept: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Some(next) = TimeDelta::from_std(by)
            .ok()
            .and_then(|delta| self.now.get().checked_add_signed(delta))
        {
            self.now.set(next);
        }
    }

    /// Total simulated sleep so far.
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_sleep() {
        let start = DateTime::<Utc>::from_timestamp(0, 0).expect("epoch");
        let clock = ManualClock::starting_at(start);
        clock.sleep(Duration::from_millis(1_500));
        clock.sleep(Duration::from_millis(500));
        assert_eq!(clock.total_slept(), Duration::from_secs(2));
        assert_eq!((clock.now() - start).num_seconds(), 2);
    }
}
