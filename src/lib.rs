//! muxgate: real-time admission gate for single-file audio/video capture
//!
//! Camera and microphone callbacks deliver timestamped samples on their own
//! schedules. Written straight into a container they produce files that
//! fail to finalize: audio recorded before the first video frame, duplicate
//! or tightly spaced video timestamps, appends while the writer is busy.
//! This crate sits between the callbacks and the writer and decides, sample
//! by sample, what gets written.
//!
//! # Features
//! - Session gate anchored on the first admitted video frame
//! - Video admission with a minimum timestamp spacing (15 ms by default)
//! - Audio admission that waits for the session to start
//! - Container writer lifecycle with a single completion callback
//! - Serial admission thread fed by a bounded queue
//! - MP4 output through muxide (feature `recording`)
//!
//! # Usage
//! ```rust,ignore
//! use muxgate::{CaptureQueue, GateConfig, MemorySink, Recorder, Sample, StatusLog};
//!
//! let mut recorder = Recorder::new(MemorySink::new(), GateConfig::default(), StatusLog::new());
//! recorder.start()?;
//! let queue = CaptureQueue::spawn(recorder, 64)?;
//! queue.push(sample)?;
//! let outcome = queue.stop().wait()?;
//! ```
pub mod config;
pub mod device;
pub mod errors;
pub mod gate;
pub mod recording;
pub mod status;
pub mod timing;
pub mod types;
pub mod writer;

// Testing utilities - synthetic capture data for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::MuxGateConfig;
pub use device::{apply_profile, CameraPosition, DeviceConfigurator, DeviceReport, Microphone};
pub use errors::MuxError;
pub use gate::{Admission, AudioAdmission, GateConfig, SessionGate, VideoAdmission};
pub use recording::{
    CaptureProfile, CaptureQueue, Recorder, RecordingOutcome, RecordingQuality, RecordingState,
    RecordingStats,
};
pub use status::StatusLog;
pub use timing::{CaptureClock, MediaTime};
pub use types::{Sample, Track};
#[cfg(feature = "recording")]
pub use writer::Mp4Sink;
pub use writer::{ContainerWriter, FinishStatus, MediaSink, MemorySink, WriterState};

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "muxgate=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        mp4_output: cfg!(feature = "recording"),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Whether the muxide-backed MP4 sink is compiled in
    pub mp4_output: bool,
}
