//! Time sources
//!
//! Alerts and reports carry wall-clock timestamps, but the elapsed-time math in the
//! trackers must never go backwards when the system clock is adjusted. `SystemClock`
//! therefore anchors a wall-clock reading to a monotonic `Instant` once and derives
//! every later reading from the monotonic offset.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::time::Instant;

/// A source of timestamps for session control and status reads
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock anchored to a monotonic instant
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.anchor.elapsed()).unwrap_or_else(|_| Duration::zero());
        self.anchor_wall + elapsed
    }
}

/// Manually driven clock, used for replaying recorded frame streams and in tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock to `at`. Moving backwards is ignored.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut now = self.now.lock();
        if at > *now {
            *now = at;
        }
    }

    /// Advance the clock by a fractional number of seconds
    pub fn advance_secs(&self, secs: f64) {
        let mut now = self.now.lock();
        *now += duration_from_secs(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Seconds elapsed from `start` to `end`, never negative
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    let secs = match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    };
    secs.max(0.0)
}

/// Convert fractional seconds to a chrono duration (microsecond precision)
pub fn duration_from_secs(secs: f64) -> Duration {
    Duration::microseconds((secs * 1_000_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_seconds_between_fractional() {
        let end = t0() + duration_from_secs(3.5);
        assert!((seconds_between(t0(), end) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_seconds_between_never_negative() {
        let earlier = t0() - Duration::seconds(10);
        assert_eq!(seconds_between(t0(), earlier), 0.0);
    }

    #[test]
    fn test_manual_clock_ignores_backwards_set() {
        let clock = ManualClock::new(t0());
        clock.advance_secs(2.0);
        clock.set(t0());
        assert_eq!(clock.now(), t0() + Duration::seconds(2));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
