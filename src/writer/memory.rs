//! In-memory sink
//!
//! Records every accepted sample instead of producing a file. Clones share
//! state, so a test (or a UI) can keep a handle while the recorder owns the
//! sink on the admission thread, flip readiness, and inject failures.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{MediaSink, SinkSummary};
use crate::errors::MuxError;
use crate::timing::MediaTime;
use crate::types::{Sample, Track};

/// A sample as the sink saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSample {
    pub track: Track,
    pub timestamp: MediaTime,
    pub payload_len: usize,
}

#[derive(Debug)]
struct MemoryState {
    ready: [bool; 2],
    reject_appends: bool,
    begin_failure: Option<String>,
    finalize_failure: Option<String>,
    begun: bool,
    origin: Option<MediaTime>,
    finished: [bool; 2],
    finalized: bool,
    written: Vec<WrittenSample>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            ready: [true; 2],
            reject_appends: false,
            begin_failure: None,
            finalize_failure: None,
            begun: false,
            origin: None,
            finished: [false; 2],
            finalized: false,
            written: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_ready(&self, track: Track, ready: bool) {
        self.lock().ready[track.index()] = ready;
    }

    pub fn reject_appends(&self, reject: bool) {
        self.lock().reject_appends = reject;
    }

    pub fn fail_begin(&self, reason: impl Into<String>) {
        self.lock().begin_failure = Some(reason.into());
    }

    pub fn fail_finalize(&self, reason: impl Into<String>) {
        self.lock().finalize_failure = Some(reason.into());
    }

    pub fn written(&self) -> Vec<WrittenSample> {
        self.lock().written.clone()
    }

    pub fn written_on(&self, track: Track) -> Vec<MediaTime> {
        self.lock()
            .written
            .iter()
            .filter(|s| s.track == track)
            .map(|s| s.timestamp)
            .collect()
    }

    pub fn origin(&self) -> Option<MediaTime> {
        self.lock().origin
    }

    pub fn is_track_finished(&self, track: Track) -> bool {
        self.lock().finished[track.index()]
    }

    pub fn finalized(&self) -> bool {
        self.lock().finalized
    }
}

impl MediaSink for MemorySink {
    fn begin(&mut self) -> Result<(), MuxError> {
        let mut state = self.lock();
        if let Some(reason) = &state.begin_failure {
            return Err(MuxError::Io(reason.clone()));
        }
        state.begun = true;
        Ok(())
    }

    fn is_ready(&self, track: Track) -> bool {
        let state = self.lock();
        state.begun && state.ready[track.index()]
    }

    fn start_session(&mut self, origin: MediaTime) {
        self.lock().origin = Some(origin);
    }

    fn append(&mut self, track: Track, sample: &Sample) -> bool {
        let mut state = self.lock();
        if state.reject_appends || state.finished[track.index()] {
            return false;
        }
        state.written.push(WrittenSample {
            track,
            timestamp: sample.timestamp,
            payload_len: sample.payload.len(),
        });
        true
    }

    fn mark_finished(&mut self, track: Track) {
        self.lock().finished[track.index()] = true;
    }

    fn finalize(&mut self) -> Result<SinkSummary, MuxError> {
        let mut state = self.lock();
        if let Some(reason) = &state.finalize_failure {
            return Err(MuxError::Muxing(reason.clone()));
        }
        state.finalized = true;

        let count = |track: Track| state.written.iter().filter(|s| s.track == track).count() as u64;
        let duration_secs = match (state.origin, state.written.iter().map(|s| s.timestamp).max()) {
            (Some(origin), Some(last)) => last.since(origin).as_secs_f64().max(0.0),
            _ => 0.0,
        };

        Ok(SinkSummary {
            video_samples: count(Track::Video),
            audio_samples: count(Track::Audio),
            duration_secs,
            bytes_written: state.written.iter().map(|s| s.payload_len as u64).sum(),
            output_path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_before_begin() {
        let mut sink = MemorySink::new();
        assert!(!sink.is_ready(Track::Video));
        sink.begin().unwrap();
        assert!(sink.is_ready(Track::Video));
    }

    #[test]
    fn test_summary_counts_tracks() {
        let mut sink = MemorySink::new();
        sink.begin().unwrap();
        sink.start_session(MediaTime::from_millis(100));
        sink.append(Track::Video, &Sample::video(MediaTime::from_millis(100), vec![0u8; 10]));
        sink.append(Track::Audio, &Sample::audio(MediaTime::from_millis(110), vec![0u8; 4]));
        sink.append(Track::Video, &Sample::video(MediaTime::from_millis(133), vec![0u8; 10]));

        let summary = sink.finalize().unwrap();
        assert_eq!(summary.video_samples, 2);
        assert_eq!(summary.audio_samples, 1);
        assert_eq!(summary.bytes_written, 24);
        assert!((summary.duration_secs - 0.033).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_after_track_finished() {
        let mut sink = MemorySink::new();
        sink.begin().unwrap();
        sink.mark_finished(Track::Audio);
        assert!(!sink.append(Track::Audio, &Sample::audio(MediaTime::ZERO, vec![1u8])));
        assert!(sink.is_track_finished(Track::Audio));
    }
}
