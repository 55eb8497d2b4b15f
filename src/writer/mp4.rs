//! MP4 sink backed by muxide
//!
//! Video payloads are H.264 Annex B access units, audio payloads ADTS-framed
//! AAC. Timestamps are rebased onto the session origin before muxing, so
//! the first admitted video frame lands at zero.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use muxide::api::{AacProfile, AudioCodec, Metadata, Muxer, MuxerBuilder, VideoCodec};

use super::{MediaSink, SinkSummary};
use crate::errors::MuxError;
use crate::recording::{AudioFormat, RecordingQuality};
use crate::timing::MediaTime;
use crate::types::{Sample, Track};

pub struct Mp4Sink {
    output_path: PathBuf,
    quality: RecordingQuality,
    fast_start: bool,
    title: Option<String>,
    muxer: Option<Muxer<BufWriter<File>>>,
    origin: Option<MediaTime>,
    finished: [bool; 2],
}

impl Mp4Sink {
    /// Describe the output; nothing is opened until the writer starts
    pub fn new<P: AsRef<Path>>(output_path: P, quality: RecordingQuality) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            quality,
            fast_start: true,
            title: None,
            muxer: None,
            origin: None,
            finished: [false; 2],
        }
    }

    pub fn with_fast_start(mut self, enabled: bool) -> Self {
        self.fast_start = enabled;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn pts(&self, sample: &Sample) -> Option<f64> {
        self.origin
            .map(|origin| sample.timestamp.since(origin).as_secs_f64())
    }
}

impl MediaSink for Mp4Sink {
    fn begin(&mut self) -> Result<(), MuxError> {
        if self.muxer.is_some() {
            return Err(MuxError::InvalidState("MP4 sink already open".to_string()));
        }

        let file = File::create(&self.output_path)
            .map_err(|e| MuxError::Io(format!("Failed to create output file: {}", e)))?;

        let video = self.quality.video_settings();
        let audio = self.quality.audio_settings();
        let audio_codec = match audio.format {
            AudioFormat::AacLc => AudioCodec::Aac(AacProfile::Lc),
        };

        let mut metadata = Metadata::new().with_current_time();
        if let Some(ref title) = self.title {
            metadata = metadata.with_title(title);
        }

        let muxer = MuxerBuilder::new(BufWriter::new(file))
            .video(VideoCodec::H264, video.width, video.height, video.expected_fps)
            .audio(audio_codec, audio.sample_rate, audio.channels)
            .with_metadata(metadata)
            .with_fast_start(self.fast_start)
            .build()
            .map_err(|e| MuxError::Muxing(format!("Failed to create muxer: {}", e)))?;

        self.muxer = Some(muxer);
        log::info!("Writing MP4 to {}", self.output_path.display());
        Ok(())
    }

    fn is_ready(&self, track: Track) -> bool {
        self.muxer.is_some() && !self.finished[track.index()]
    }

    fn start_session(&mut self, origin: MediaTime) {
        self.origin = Some(origin);
    }

    fn append(&mut self, track: Track, sample: &Sample) -> bool {
        let Some(pts) = self.pts(sample) else {
            return false;
        };
        let Some(muxer) = self.muxer.as_mut() else {
            return false;
        };

        let result = match track {
            Track::Video => muxer.write_video(pts, &sample.payload, contains_idr(&sample.payload)),
            Track::Audio => muxer.write_audio(pts, &sample.payload),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Muxer rejected {} sample at {:.3}s: {}", track, pts, e);
                false
            }
        }
    }

    fn mark_finished(&mut self, track: Track) {
        self.finished[track.index()] = true;
    }

    fn finalize(&mut self) -> Result<SinkSummary, MuxError> {
        let muxer = self
            .muxer
            .take()
            .ok_or_else(|| MuxError::InvalidState("MP4 sink was never opened".to_string()))?;

        let stats = muxer
            .finish_with_stats()
            .map_err(|e| MuxError::Muxing(format!("Failed to finalize recording: {}", e)))?;

        Ok(SinkSummary {
            video_samples: stats.video_frames,
            audio_samples: stats.audio_frames,
            duration_secs: stats.duration_secs,
            bytes_written: stats.bytes_written,
            output_path: Some(self.output_path.to_string_lossy().to_string()),
        })
    }
}

/// Whether an Annex B access unit carries an IDR slice
fn contains_idr(data: &[u8]) -> bool {
    let mut i = 0;
    while i + 3 < data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            if data[i + 3] & 0x1F == 5 {
                return true;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    false
}
