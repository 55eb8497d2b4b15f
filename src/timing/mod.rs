//! Media timestamps and the capture clock
//!
//! Every sample carries a [`MediaTime`]: a signed nanosecond count on the
//! capture clock. Signed so that samples captured before the session origin
//! remain representable.

use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Presentation time on the capture clock, in nanoseconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MediaTime(i64);

impl MediaTime {
    pub const ZERO: MediaTime = MediaTime(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros.saturating_mul(1_000))
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * NANOS_PER_SEC as f64).round() as i64)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Signed offset of `self` from `origin`
    pub fn since(self, origin: MediaTime) -> MediaTime {
        MediaTime(self.0.saturating_sub(origin.0))
    }
}

fn duration_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

impl Add<Duration> for MediaTime {
    type Output = MediaTime;

    fn add(self, rhs: Duration) -> MediaTime {
        MediaTime(self.0.saturating_add(duration_nanos(rhs)))
    }
}

impl Sub<Duration> for MediaTime {
    type Output = MediaTime;

    fn sub(self, rhs: Duration) -> MediaTime {
        MediaTime(self.0.saturating_sub(duration_nanos(rhs)))
    }
}

impl fmt::Display for MediaTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

/// Monotonic capture clock
///
/// Audio and video sources stamp their samples from clones of the same
/// clock so both tracks share one timebase.
#[derive(Debug, Clone)]
pub struct CaptureClock {
    start: Arc<Instant>,
}

impl CaptureClock {
    /// Create a new clock with the current instant as time zero
    pub fn new() -> Self {
        Self {
            start: Arc::new(Instant::now()),
        }
    }

    /// Create a clock from an existing start instant
    pub fn from_instant(start: Instant) -> Self {
        Self {
            start: Arc::new(start),
        }
    }

    /// Current time on this clock
    #[inline]
    pub fn now(&self) -> MediaTime {
        self.at(Instant::now())
    }

    /// Time on this clock for a given instant
    ///
    /// Instants earlier than the clock start map to negative times.
    pub fn at(&self, instant: Instant) -> MediaTime {
        match instant.checked_duration_since(*self.start) {
            Some(elapsed) => MediaTime::ZERO + elapsed,
            None => MediaTime::ZERO - self.start.duration_since(instant),
        }
    }

    pub fn start_instant(&self) -> Instant {
        *self.start
    }
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::new()
    }
}
