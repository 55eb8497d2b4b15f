//! Container writer: the state machine wrapped around a muxing sink
//!
//! [`MediaSink`] is the boundary to whatever actually produces the file.
//! [`ContainerWriter`] owns a sink and enforces the recording lifecycle on
//! top of it:
//!
//! ```text
//! NotStarted --start_writing--> Writing --finish--> Finishing --> Completed | Failed
//!      \--(sink refuses to begin)--> Failed
//! ```
//!
//! Appends are only accepted while `Writing`. `finish` runs once; later
//! calls are no-ops.

mod memory;
#[cfg(feature = "recording")]
mod mp4;

pub use memory::{MemorySink, WrittenSample};
#[cfg(feature = "recording")]
pub use mp4::Mp4Sink;

use serde::{Deserialize, Serialize};

use crate::errors::MuxError;
use crate::timing::MediaTime;
use crate::types::{Sample, Track};

/// What a sink reports once the file is finalized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkSummary {
    pub video_samples: u64,
    pub audio_samples: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub output_path: Option<String>,
}

/// The muxing backend behind a [`ContainerWriter`]
pub trait MediaSink {
    /// Open the output and get ready to accept samples
    fn begin(&mut self) -> Result<(), MuxError>;

    /// Backpressure signal: `false` means the sample should be dropped now
    fn is_ready(&self, track: Track) -> bool;

    /// Establish the time base of the container
    fn start_session(&mut self, origin: MediaTime);

    /// Write one sample; `false` means the sink rejected it
    fn append(&mut self, track: Track, sample: &Sample) -> bool;

    /// No more samples will arrive for `track`
    fn mark_finished(&mut self, track: Track);

    /// Finalize the file
    fn finalize(&mut self) -> Result<SinkSummary, MuxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriterState {
    NotStarted,
    Writing,
    Finishing,
    Completed,
    Failed,
}

impl WriterState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WriterState::Completed | WriterState::Failed)
    }
}

/// Final status handed to the completion callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishStatus {
    Completed,
    Failed(String),
}

impl FinishStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, FinishStatus::Completed)
    }
}

pub struct ContainerWriter<S: MediaSink> {
    sink: S,
    state: WriterState,
    session_origin: Option<MediaTime>,
    finished: [bool; 2],
    summary: Option<SinkSummary>,
    failure: Option<String>,
}

impl<S: MediaSink> ContainerWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: WriterState::NotStarted,
            session_origin: None,
            finished: [false; 2],
            summary: None,
            failure: None,
        }
    }

    /// Move from `NotStarted` to `Writing`
    pub fn start_writing(&mut self) -> Result<(), MuxError> {
        if self.state != WriterState::NotStarted {
            return Err(MuxError::InvalidState(format!(
                "writer cannot start from {:?}",
                self.state
            )));
        }

        match self.sink.begin() {
            Ok(()) => {
                self.state = WriterState::Writing;
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.state = WriterState::Failed;
                self.failure = Some(reason.clone());
                Err(MuxError::StartFailed(reason))
            }
        }
    }

    pub fn is_ready(&self, track: Track) -> bool {
        self.state == WriterState::Writing
            && !self.finished[track.index()]
            && self.sink.is_ready(track)
    }

    /// Anchor the container time base; allowed once per recording
    pub fn start_session(&mut self, origin: MediaTime) -> Result<(), MuxError> {
        if self.state != WriterState::Writing {
            return Err(MuxError::InvalidState(format!(
                "session cannot start while {:?}",
                self.state
            )));
        }
        if let Some(existing) = self.session_origin {
            return Err(MuxError::InvalidState(format!(
                "session already started at {}",
                existing
            )));
        }

        self.sink.start_session(origin);
        self.session_origin = Some(origin);
        Ok(())
    }

    pub fn append(&mut self, track: Track, sample: &Sample) -> bool {
        if self.state != WriterState::Writing
            || self.session_origin.is_none()
            || self.finished[track.index()]
        {
            return false;
        }
        self.sink.append(track, sample)
    }

    pub fn mark_finished(&mut self, track: Track) {
        if self.finished[track.index()] {
            return;
        }
        self.finished[track.index()] = true;
        self.sink.mark_finished(track);
    }

    /// Finalize the file and report the outcome through `callback`
    ///
    /// Returns `false` without calling `callback` when the writer is not in
    /// `Writing`; finishing is not repeatable.
    pub fn finish<F>(&mut self, callback: F) -> bool
    where
        F: FnOnce(FinishStatus),
    {
        if self.state != WriterState::Writing {
            log::debug!("Ignoring finish while writer is {:?}", self.state);
            return false;
        }

        self.state = WriterState::Finishing;
        for track in Track::ALL {
            self.mark_finished(track);
        }

        let status = match self.sink.finalize() {
            Ok(summary) => {
                self.summary = Some(summary);
                self.state = WriterState::Completed;
                FinishStatus::Completed
            }
            Err(e) => {
                let reason = e.to_string();
                self.failure = Some(reason.clone());
                self.state = WriterState::Failed;
                FinishStatus::Failed(reason)
            }
        };

        callback(status);
        true
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn session_origin(&self) -> Option<MediaTime> {
        self.session_origin
    }

    pub fn is_finished(&self, track: Track) -> bool {
        self.finished[track.index()]
    }

    pub fn summary(&self) -> Option<&SinkSummary> {
        self.summary.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
