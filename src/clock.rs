//! Clock abstraction and timestamp display selection.
//!
//! Records capture their timestamp from a [`Clock`] so tests can pin time.
//! [`TimeDisplay`] decides which of the injected clock and the wall clock a
//! formatter prints.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock. Default for every logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually advanced clock for tests.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use treelog::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
/// clock.advance_secs(90);
/// assert_eq!(clock.now().to_rfc3339(), "2024-05-01T12:01:30+00:00");
/// ```
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        FixedClock {
            now: Arc::new(Mutex::new(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Which timestamp(s) a formatter renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeDisplay {
    /// Wall clock when the record clock agrees with it, otherwise both.
    #[default]
    Auto,
    /// Only the injected clock's time.
    Clock,
    /// Only the wall clock.
    WallClock,
    /// Always `"<wall> [<clock>]"`.
    Both,
    /// Omit timestamps entirely.
    Off,
}

impl TimeDisplay {
    /// Resolves the record timestamp and the wall-clock instant into what a
    /// formatter should print: `None` when timestamps are off, otherwise the
    /// primary instant plus an optional secondary one rendered as
    /// `"<primary> [<secondary>]"`. Every timestamp layout derives from this
    /// one decision.
    pub fn instants(
        &self,
        clock_time: DateTime<Utc>,
        wall_time: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, Option<DateTime<Utc>>)> {
        match self {
            TimeDisplay::Off => None,
            TimeDisplay::Clock => Some((clock_time, None)),
            TimeDisplay::WallClock => Some((wall_time, None)),
            TimeDisplay::Both => Some((wall_time, Some(clock_time))),
            TimeDisplay::Auto => {
                // Sub-second skew counts as agreement; an injected test clock
                // differs by far more than that.
                if (wall_time - clock_time).num_seconds().abs() < 1 {
                    Some((wall_time, None))
                } else {
                    Some((wall_time, Some(clock_time)))
                }
            }
        }
    }
}
