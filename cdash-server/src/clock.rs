//! # Calendar Clock
//!
//! Source of "today" for keying daily records. Round cadence uses tokio time
//! directly; only the calendar date needs a seam.

use std::sync::{Arc, Mutex};

use chrono::Local;

use cdash_common::DayKey;

/// Supplies the current calendar day.
pub trait Clock: Send + Sync {
    /// Returns today's key in the daemon's local time zone.
    fn today(&self) -> DayKey;
}

/// Wall-clock implementation using the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DayKey {
        DayKey::new(Local::now().date_naive())
    }
}

/// Manually driven clock; clones share the same day.
#[derive(Debug, Clone)]
pub struct FixedClock {
    day: Arc<Mutex<DayKey>>,
}

impl FixedClock {
    /// Creates a clock pinned to `day`.
    pub fn new(day: DayKey) -> Self {
        FixedClock {
            day: Arc::new(Mutex::new(day)),
        }
    }

    /// Moves the clock to `day`.
    pub fn set(&self, day: DayKey) {
        *self.day.lock().expect("clock mutex poisoned") = day;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DayKey {
        *self.day.lock().expect("clock mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_follows_set() {
        let clock = FixedClock::new(DayKey::from_ymd(2024, 3, 9).unwrap());
        let shared = clock.clone();
        assert_eq!(shared.today().to_string(), "2024-3-9");
        clock.set(DayKey::from_ymd(2024, 3, 10).unwrap());
        assert_eq!(shared.today().to_string(), "2024-3-10");
    }
}
