//! Wall-clock sources for the lab.
//!
//! The engine owns no timer. Drivers call `tick()` at their own cadence and
//! the engine asks its clock what time it is. Tests and the autoplay
//! simulator use `ManualClock` so every interval is exact and repeatable.

use crate::types::Timestamp;
use chrono::{DateTime, Duration, Utc};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

/// Anything that can tell the engine the current time.
pub trait LabClock: Send {
    fn now(&self) -> Timestamp;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl LabClock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A hand-driven clock with nanosecond resolution.
///
/// Clones share the same instant: hand one clone to the engine and keep
/// another to move time forward (or backward) from the test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    nanos: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            nanos: Arc::new(AtomicI64::new(to_nanos(start))),
        }
    }

    /// Starts at 2024-01-01T00:00:00Z.
    pub fn at_epoch() -> Self {
        Self::new(DateTime::from_timestamp_nanos(1_704_067_200_000_000_000))
    }

    pub fn set(&self, instant: Timestamp) {
        self.nanos.store(to_nanos(instant), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let step = by.num_nanoseconds().unwrap_or(i64::MAX);
        let current = self.nanos.load(Ordering::SeqCst);
        self.nanos
            .store(current.saturating_add(step), Ordering::SeqCst);
    }

    /// Advance by fractional seconds. Negative values move time backwards.
    pub fn advance_secs(&self, seconds: f64) {
        self.advance(Duration::nanoseconds((seconds * 1_000_000_000.0) as i64));
    }

    pub fn advance_millis(&self, millis: i64) {
        self.advance(Duration::milliseconds(millis));
    }
}

impl LabClock for ManualClock {
    fn now(&self) -> Timestamp {
        DateTime::from_timestamp_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn to_nanos(instant: Timestamp) -> i64 {
    // Out of range only past year 2262.
    instant.timestamp_nanos_opt().unwrap_or(i64::MAX)
}
