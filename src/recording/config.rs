//! Recording configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::{CameraPosition, Microphone};
use crate::gate::Admission;
use crate::types::Track;

/// H.264 profile/level written into the video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum H264ProfileLevel {
    Baseline31,
    Main41,
    High41,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntropyMode {
    Cavlc,
    Cabac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    /// AAC Low Complexity, ADTS framed
    AacLc,
}

/// Video compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub bitrate: u32,
    pub profile_level: H264ProfileLevel,
    pub entropy_mode: EntropyMode,
    pub expected_fps: f64,
    pub max_keyframe_interval: Duration,
    pub allow_frame_reordering: bool,
}

/// Audio compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub format: AudioFormat,
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate_per_channel: u32,
}

impl AudioSettings {
    /// Samples carried by one AAC access unit
    pub const SAMPLES_PER_PACKET: u32 = 1024;

    /// Duration of one encoded packet
    pub fn packet_duration(&self) -> Duration {
        Duration::from_secs_f64(Self::SAMPLES_PER_PACKET as f64 / self.sample_rate as f64)
    }
}

/// Quality presets for recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingQuality {
    /// Portrait 648x1152 H.264 High 4.1 with mono AAC
    #[default]
    Medium,
}

impl RecordingQuality {
    pub fn video_settings(&self) -> VideoSettings {
        match self {
            RecordingQuality::Medium => VideoSettings {
                width: 648,
                height: 1152,
                bitrate: 819_200,
                profile_level: H264ProfileLevel::High41,
                entropy_mode: EntropyMode::Cabac,
                expected_fps: 30.0,
                max_keyframe_interval: Duration::from_secs(1),
                allow_frame_reordering: true,
            },
        }
    }

    pub fn audio_settings(&self) -> AudioSettings {
        match self {
            RecordingQuality::Medium => AudioSettings {
                format: AudioFormat::AacLc,
                sample_rate: 44_100,
                channels: 1,
                bitrate_per_channel: 64_000,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingQuality::Medium => "medium",
        }
    }
}

/// Which inputs to capture and at what quality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    pub camera: CameraPosition,
    pub microphone: Microphone,
    pub quality: RecordingQuality,
}

impl CaptureProfile {
    pub fn new(camera: CameraPosition, microphone: Microphone, quality: RecordingQuality) -> Self {
        Self {
            camera,
            microphone,
            quality,
        }
    }

    /// Audio only: no camera, the built-in microphone route left alone
    pub fn audio_only() -> Self {
        Self::new(CameraPosition::None, Microphone::Ignore, RecordingQuality::Medium)
    }

    /// Frame duration the camera is locked to
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.quality.video_settings().expected_fps)
    }

    pub fn captures(&self, track: Track) -> bool {
        match track {
            Track::Video => self.camera != CameraPosition::None,
            Track::Audio => true,
        }
    }
}

impl Default for CaptureProfile {
    fn default() -> Self {
        Self::new(CameraPosition::Back, Microphone::Back, RecordingQuality::Medium)
    }
}

/// Statistics for one recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingStats {
    pub video_admitted: u64,
    pub audio_admitted: u64,
    pub dropped_not_ready: u64,
    pub dropped_low_delta: u64,
    pub dropped_session_not_started: u64,
    pub write_failures: u64,
    /// Samples the capture queue refused because it was full
    pub queue_overflows: u64,
    /// Samples still queued when the recording was stopped
    pub discarded_after_stop: u64,
    /// Session origin on the capture clock, in seconds
    pub session_origin_secs: Option<f64>,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub output_path: Option<String>,
}

impl RecordingStats {
    pub fn record(&mut self, track: Track, admission: Admission) {
        match admission {
            Admission::Admitted => match track {
                Track::Video => self.video_admitted += 1,
                Track::Audio => self.audio_admitted += 1,
            },
            Admission::DroppedNotReady => self.dropped_not_ready += 1,
            Admission::DroppedLowDelta => self.dropped_low_delta += 1,
            Admission::DroppedSessionNotStarted => self.dropped_session_not_started += 1,
            Admission::WriteFailed => self.write_failures += 1,
        }
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped_not_ready
            + self.dropped_low_delta
            + self.dropped_session_not_started
            + self.queue_overflows
            + self.discarded_after_stop
    }

    /// Average bitrate achieved, in bits per second
    pub fn avg_bitrate(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.bytes_written as f64 * 8.0) / self.duration_secs
        } else {
            0.0
        }
    }
}
