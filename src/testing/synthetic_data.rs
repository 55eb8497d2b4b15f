//! Synthetic capture data
//!
//! Stands in for a camera and microphone: a timeline of interleaved samples
//! with the shape real capture callbacks produce (audio starting before the
//! first video frame, 30 fps video, ~23 ms AAC packets), plus knobs to inject
//! the duplicate and jittered video timestamps that break naive muxing.

use std::time::Duration;

use bytes::Bytes;

use crate::device::{CameraPosition, DeviceConfigurator, Microphone};
use crate::errors::MuxError;
use crate::recording::{AudioSettings, CaptureProfile};
use crate::timing::MediaTime;
use crate::types::{Sample, Track};

/// ADTS sampling frequency table
const ADTS_SAMPLE_RATES: [u32; 13] = [
    96_000, 88_200, 64_000, 48_000, 44_100, 32_000, 24_000, 22_050, 16_000, 12_000, 11_025, 8_000,
    7_350,
];

/// Raw AAC-LC access unit decoding to silence (single channel element)
const SILENT_AAC_LC: [u8; 4] = [0x01, 0x40, 0x20, 0x07];

/// Timing of a synthetic capture
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSchedule {
    pub frame_duration: Duration,
    pub audio_packet: Duration,
    /// How long audio runs before the first video frame
    pub audio_lead: Duration,
    /// Capture length, measured from the first video frame
    pub length: Duration,
    /// Repeat every nth video timestamp
    pub duplicate_every: Option<u64>,
    /// Added to every odd video frame
    pub jitter: Duration,
    pub video: bool,
    pub audio: bool,
}

impl SyntheticSchedule {
    /// Schedule matching what `profile` would capture
    pub fn for_profile(profile: &CaptureProfile, length: Duration) -> Self {
        Self {
            frame_duration: profile.frame_duration(),
            audio_packet: profile.quality.audio_settings().packet_duration(),
            audio_lead: Duration::from_millis(50),
            length,
            duplicate_every: None,
            jitter: Duration::ZERO,
            video: profile.captures(Track::Video),
            audio: profile.captures(Track::Audio),
        }
    }

    pub fn with_duplicates(mut self, every: u64) -> Self {
        self.duplicate_every = Some(every.max(1));
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_audio_lead(mut self, lead: Duration) -> Self {
        self.audio_lead = lead;
        self
    }

    /// Every sample as (track, timestamp), in delivery order
    pub fn timeline(&self) -> Vec<(Track, MediaTime)> {
        let end = MediaTime::ZERO + self.length;
        let mut timeline = Vec::new();

        if self.audio && !self.audio_packet.is_zero() {
            let mut ts = MediaTime::ZERO - self.audio_lead;
            while ts < end {
                timeline.push((Track::Audio, ts));
                ts = ts + self.audio_packet;
            }
        }

        if self.video && !self.frame_duration.is_zero() {
            let mut n = 0u64;
            loop {
                let base = MediaTime::ZERO + self.frame_duration * n as u32;
                if base >= end {
                    break;
                }
                let ts = if n % 2 == 1 { base + self.jitter } else { base };
                timeline.push((Track::Video, ts));
                if let Some(every) = self.duplicate_every {
                    if n % every == every - 1 {
                        timeline.push((Track::Video, ts));
                    }
                }
                n += 1;
            }
        }

        // stable: duplicates stay adjacent, audio wins ties
        timeline.sort_by_key(|(track, ts)| (*ts, track.index()));
        timeline
    }

    /// Timeline with placeholder payloads
    pub fn samples(&self) -> Vec<Sample> {
        let audio = Bytes::from_static(&SILENT_AAC_LC);
        self.timeline()
            .into_iter()
            .enumerate()
            .map(|(i, (track, ts))| match track {
                Track::Audio => Sample::audio(ts, audio.clone()),
                Track::Video => Sample::video(ts, Bytes::from((i as u32).to_be_bytes().to_vec())),
            })
            .collect()
    }
}

/// Wrap a raw AAC access unit in a 7-byte ADTS header (no CRC)
pub fn adts_frame(raw: &[u8], settings: &AudioSettings) -> Result<Vec<u8>, MuxError> {
    let sf_index = ADTS_SAMPLE_RATES
        .iter()
        .position(|&rate| rate == settings.sample_rate)
        .ok_or_else(|| {
            MuxError::Config(format!("No ADTS index for {} Hz", settings.sample_rate))
        })? as u8;
    let channels = settings.channels as u8;
    if channels == 0 || channels > 7 {
        return Err(MuxError::Config(format!(
            "ADTS cannot carry {} channels",
            settings.channels
        )));
    }

    let len = raw.len() + 7;
    if len > 0x1FFF {
        return Err(MuxError::Config(format!("ADTS frame too large: {} bytes", len)));
    }

    // profile is AAC-LC (object type 2, stored minus one)
    let profile = 1u8;
    let mut frame = Vec::with_capacity(len);
    frame.extend_from_slice(&[
        0xFF,
        0xF1,
        (profile << 6) | (sf_index << 2) | (channels >> 2),
        ((channels & 3) << 6) | ((len >> 11) as u8 & 0x03),
        ((len >> 3) & 0xFF) as u8,
        (((len & 0x07) as u8) << 5) | 0x1F,
        0xFC,
    ]);
    frame.extend_from_slice(raw);
    Ok(frame)
}

/// One ADTS-framed packet of silence
pub fn silent_aac_packet(settings: &AudioSettings) -> Result<Vec<u8>, MuxError> {
    adts_frame(&SILENT_AAC_LC, settings)
}

/// RGB24 gradient that shifts every frame
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0u8; (width * height * 3) as usize];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    data
}

/// Samples with real payloads: H.264 video and ADTS silence
///
/// Frame content is a moving gradient at the profile's resolution.
#[cfg(feature = "recording")]
pub fn encoded_samples(
    schedule: &SyntheticSchedule,
    profile: &CaptureProfile,
) -> Result<Vec<Sample>, MuxError> {
    use crate::recording::H264Encoder;

    let video = profile.quality.video_settings();
    let audio = Bytes::from(silent_aac_packet(&profile.quality.audio_settings())?);
    let mut encoder = H264Encoder::new(&video)?;
    let mut frame_number = 0u64;
    let mut previous: Option<(MediaTime, Bytes)> = None;

    let mut samples = Vec::new();
    for (track, ts) in schedule.timeline() {
        let sample = match track {
            Track::Audio => Sample::audio(ts, audio.clone()),
            Track::Video => match &previous {
                // a duplicated timestamp re-delivers the same frame
                Some((last_ts, payload)) if *last_ts == ts => Sample::video(ts, payload.clone()),
                _ => {
                    let rgb = synthetic_video_frame(frame_number, video.width, video.height);
                    let payload = Bytes::from(encoder.encode_rgb(&rgb)?.data);
                    frame_number += 1;
                    previous = Some((ts, payload.clone()));
                    Sample::video(ts, payload)
                }
            },
        };
        samples.push(sample);
    }
    Ok(samples)
}

/// In-memory camera and microphone configuration
#[derive(Debug, Default)]
pub struct SyntheticDevices {
    camera: Option<CameraPosition>,
    frame_duration: Option<Duration>,
    mirrored: bool,
    microphone: Option<Microphone>,
    camera_failure: Option<String>,
    audio_failure: Option<String>,
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_camera(&mut self, reason: impl Into<String>) {
        self.camera_failure = Some(reason.into());
    }

    pub fn fail_audio_route(&mut self, reason: impl Into<String>) {
        self.audio_failure = Some(reason.into());
    }

    /// Camera selected by the last successful configuration
    pub fn camera(&self) -> Option<CameraPosition> {
        self.camera
    }

    pub fn frame_duration(&self) -> Option<Duration> {
        self.frame_duration
    }

    /// Whether the configured camera output is mirrored
    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn microphone(&self) -> Option<Microphone> {
        self.microphone
    }
}

impl DeviceConfigurator for SyntheticDevices {
    fn configure_camera(
        &mut self,
        camera: CameraPosition,
        frame_duration: Duration,
    ) -> Result<(), MuxError> {
        if let Some(reason) = &self.camera_failure {
            return Err(MuxError::Device(reason.clone()));
        }
        if camera == CameraPosition::None {
            return Err(MuxError::Device("no camera selected".to_string()));
        }
        self.camera = Some(camera);
        self.frame_duration = Some(frame_duration);
        self.mirrored = camera.is_mirrored();
        Ok(())
    }

    fn route_audio(&mut self, microphone: Microphone) -> Result<(), MuxError> {
        if let Some(reason) = &self.audio_failure {
            return Err(MuxError::Device(reason.clone()));
        }
        self.microphone = Some(microphone);
        Ok(())
    }
}
