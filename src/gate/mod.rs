//! Admission gate for the two capture streams
//!
//! Audio and video arrive independently but land in one container with one
//! time base. The gate decides, per sample, whether it may be written:
//!
//! - [`SessionGate`] holds the recording origin and opens exactly once.
//! - [`VideoAdmission`] drops frames while the writer is busy, or when a
//!   frame is not at least `minimum_delta` newer than the last one written.
//!   The first frame it admits opens the session.
//! - [`AudioAdmission`] drops everything until a video frame has opened the
//!   session, then only checks writer readiness.
//!
//! All three must be driven from one serial context (see
//! [`crate::recording::CaptureQueue`]); none of them lock.

mod audio;
mod session;
mod video;

pub use audio::AudioAdmission;
pub use session::SessionGate;
pub use video::VideoAdmission;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default spacing required between two admitted video frames
pub const DEFAULT_MINIMUM_DELTA: Duration = Duration::from_millis(15);

/// Outcome of offering one sample to its track's filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Admission {
    Admitted,
    DroppedNotReady,
    DroppedLowDelta,
    DroppedSessionNotStarted,
    WriteFailed,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// Drops that are ordinary backpressure rather than a writer problem
    pub fn is_expected_drop(&self) -> bool {
        matches!(
            self,
            Admission::DroppedNotReady
                | Admission::DroppedLowDelta
                | Admission::DroppedSessionNotStarted
        )
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Admission::Admitted => "admitted",
            Admission::DroppedNotReady => "dropped because writer was not ready",
            Admission::DroppedLowDelta => "dropped due to negative/low time delta",
            Admission::DroppedSessionNotStarted => "dropped while waiting for first video frame",
            Admission::WriteFailed => "rejected by writer",
        };
        f.write_str(s)
    }
}

/// Gate tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    pub minimum_delta: Duration,
}

impl GateConfig {
    pub fn with_minimum_delta(minimum_delta: Duration) -> Self {
        Self { minimum_delta }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            minimum_delta: DEFAULT_MINIMUM_DELTA,
        }
    }
}
