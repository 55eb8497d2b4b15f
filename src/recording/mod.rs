//! Recording module for muxgate
//!
//! Ties the admission gate to a container writer and runs it on a single
//! serial context:
//! - `Recorder` owns the session gate, both filters and the writer
//! - `CaptureQueue` moves a recorder onto its own admission thread
//! - `H264Encoder` (feature `recording`) turns RGB frames into Annex B
//!   payloads for the MP4 sink
//!
//! # Example
//! ```rust,ignore
//! use muxgate::recording::{CaptureQueue, Recorder};
//! use muxgate::{GateConfig, MemorySink, StatusLog};
//!
//! let mut recorder = Recorder::new(MemorySink::new(), GateConfig::default(), StatusLog::new());
//! recorder.start()?;
//! let queue = CaptureQueue::spawn(recorder, 64)?;
//!
//! // From the capture callbacks:
//! queue.push(sample)?;
//!
//! // When done:
//! let outcome = queue.stop().wait()?;
//! ```

mod config;
#[cfg(feature = "recording")]
mod encoder;
mod queue;
mod recorder;

pub use config::{
    AudioFormat, AudioSettings, CaptureProfile, EntropyMode, H264ProfileLevel, RecordingQuality,
    RecordingStats, VideoSettings,
};
#[cfg(feature = "recording")]
pub use encoder::{EncodedFrame, H264Encoder};
pub use queue::{CaptureQueue, CompletionHandle, RecordingOutcome, DEFAULT_QUEUE_CAPACITY};
pub use recorder::{Recorder, RecordingState};
