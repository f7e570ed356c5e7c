//! Wall clock and the real-to-virtual time scale.
//!
//! Everything that measures elapsed time goes through a [`Clock`] so that
//! tests can drive virtual time deterministically with [`ManualClock`].

use crate::error::{PetError, PetResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::Duration;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + delta;
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs.max(0.0)));
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// TimeScale
// =============================================================================

/// Multiplier from real time to virtual time.
///
/// `virtual_minutes = real_seconds * scale / 60`, so a scale of 60 makes one
/// real second worth one virtual minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TimeScale(f64);

impl TimeScale {
    pub const REAL_TIME: TimeScale = TimeScale(1.0);

    pub fn new(scale: f64) -> PetResult<Self> {
        if scale.is_finite() && scale > 0.0 {
            Ok(Self(scale))
        } else {
            Err(PetError::InvalidTimeScale(scale))
        }
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Convert a real span into virtual minutes. Negative spans count as zero.
    pub fn virtual_minutes(self, real: chrono::Duration) -> f64 {
        let secs = real.num_milliseconds() as f64 / 1000.0;
        (secs.max(0.0) * self.0) / 60.0
    }

    /// Virtual minutes between two instants.
    pub fn minutes_between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
        self.virtual_minutes(to - from)
    }

    /// How long `minutes` of virtual time take in real time.
    pub fn real_duration(self, minutes: f64) -> Duration {
        Duration::from_secs_f64((minutes.max(0.0) * 60.0) / self.0)
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::REAL_TIME
    }
}

impl TryFrom<f64> for TimeScale {
    type Error = PetError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TimeScale> for f64 {
    fn from(value: TimeScale) -> Self {
        value.0
    }
}
