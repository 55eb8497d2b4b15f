//! Recorder combining the admission gate and the container writer

use serde::{Deserialize, Serialize};

use super::config::RecordingStats;
use crate::errors::MuxError;
use crate::gate::{Admission, AudioAdmission, GateConfig, SessionGate, VideoAdmission};
use crate::status::StatusLog;
use crate::timing::MediaTime;
use crate::types::{Sample, Track};
use crate::writer::{ContainerWriter, FinishStatus, MediaSink, WriterState};

/// Lifecycle of one recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingState {
    Idle,
    Capturing,
    Finishing,
    Completed,
    Failed(String),
}

impl RecordingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordingState::Completed | RecordingState::Failed(_))
    }
}

/// One recording: session gate, both admission filters and the writer
///
/// Construct once per recording and drop after [`Recorder::stop`]. Every
/// method must be called from the same serial context.
pub struct Recorder<S: MediaSink> {
    writer: ContainerWriter<S>,
    session: SessionGate,
    video: VideoAdmission,
    audio: AudioAdmission,
    state: RecordingState,
    stats: RecordingStats,
    status: StatusLog,
}

impl<S: MediaSink> Recorder<S> {
    pub fn new(sink: S, config: GateConfig, status: StatusLog) -> Self {
        Self {
            writer: ContainerWriter::new(sink),
            session: SessionGate::new(),
            video: VideoAdmission::new(config.minimum_delta),
            audio: AudioAdmission::new(),
            state: RecordingState::Idle,
            stats: RecordingStats::default(),
            status,
        }
    }

    /// Idle -> Capturing
    ///
    /// A writer that will not start leaves the recorder `Failed`; the error
    /// is logged and returned, nothing else is affected.
    pub fn start(&mut self) -> Result<(), MuxError> {
        if self.state != RecordingState::Idle {
            return Err(MuxError::InvalidState(format!(
                "cannot start a recording that is {:?}",
                self.state
            )));
        }

        match self.writer.start_writing() {
            Ok(()) => {
                self.state = RecordingState::Capturing;
                self.status.info("Recording started");
                Ok(())
            }
            Err(e) => {
                self.status.warn("Asset writer failed to start");
                self.status.warn(format!("Asset writer error: {}", e));
                self.state = RecordingState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Offer one sample to its track's filter
    pub fn push(&mut self, sample: Sample) -> Result<Admission, MuxError> {
        if self.state != RecordingState::Capturing {
            return Err(MuxError::NotCapturing);
        }

        let admission = match sample.track {
            Track::Video => self
                .video
                .admit(&sample, &mut self.session, &mut self.writer),
            Track::Audio => self.audio.admit(&sample, &self.session, &mut self.writer),
        };

        self.stats.record(sample.track, admission);
        self.report(&sample, admission);
        Ok(admission)
    }

    fn report(&self, sample: &Sample, admission: Admission) {
        match admission {
            Admission::Admitted => {}
            Admission::DroppedSessionNotStarted => {
                log::trace!("Dropped {} sample at {}: {}", sample.track, sample.timestamp, admission)
            }
            Admission::DroppedNotReady | Admission::DroppedLowDelta => self
                .status
                .debug(format!("Dropped a {} frame: {}", sample.track, admission)),
            Admission::WriteFailed => self.status.warn(format!(
                "Failed to append a {} sample at {}",
                sample.track, sample.timestamp
            )),
        }
    }

    /// Capturing -> Finishing -> Completed | Failed
    ///
    /// Both tracks are marked finished, the file is finalized and
    /// `callback` runs exactly once with the final status. Stopping a
    /// recording that is not capturing is an error and does not run the
    /// callback.
    pub fn stop<F>(&mut self, callback: F) -> Result<(), MuxError>
    where
        F: FnOnce(FinishStatus),
    {
        if self.state != RecordingState::Capturing {
            return Err(MuxError::InvalidState(format!(
                "cannot stop a recording that is {:?}",
                self.state
            )));
        }
        self.state = RecordingState::Finishing;

        self.writer.mark_finished(Track::Audio);
        self.writer.mark_finished(Track::Video);

        let mut reported = None;
        self.writer.finish(|status| reported = Some(status));
        let status = reported.unwrap_or_else(|| {
            FinishStatus::Failed(format!("writer was {:?} at finish", self.writer.state()))
        });

        match &status {
            FinishStatus::Completed => {
                self.state = RecordingState::Completed;
                self.status.info("Finished recording");
            }
            FinishStatus::Failed(reason) => {
                self.state = RecordingState::Failed(reason.clone());
                self.status
                    .warn(format!("Asset writer finished with status {:?}", self.writer.state()));
                self.status.warn(format!("Asset writer error: {}", reason));
            }
        }

        if let Some(summary) = self.writer.summary() {
            self.stats.duration_secs = summary.duration_secs;
            self.stats.bytes_written = summary.bytes_written;
            self.stats.output_path = summary.output_path.clone();
        }

        callback(status);
        Ok(())
    }

    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn writer_state(&self) -> WriterState {
        self.writer.state()
    }

    pub fn session_origin(&self) -> Option<MediaTime> {
        self.session.origin()
    }

    pub fn last_video_timestamp(&self) -> Option<MediaTime> {
        self.video.last_admitted()
    }

    /// Snapshot of the statistics so far
    pub fn stats(&self) -> RecordingStats {
        let mut stats = self.stats.clone();
        stats.session_origin_secs = self.session.origin().map(MediaTime::as_secs_f64);
        stats
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn sink(&self) -> &S {
        self.writer.sink()
    }
}
