//! MP4 Recording Integration Tests
//!
//! Synthetic H.264 video and ADTS audio through the gate into a real MP4
//! file, verifying the container finalizes even when the source delivers
//! leading audio and duplicate video timestamps.
//!
//! Run with: cargo test --test mp4_recording --features recording

#![cfg(feature = "recording")]

use std::time::Duration;
use tempfile::tempdir;

use muxgate::recording::{CaptureQueue, Recorder, RecordingQuality};
use muxgate::testing::{encoded_samples, silent_aac_packet, SyntheticSchedule};
use muxgate::{
    Admission, CaptureProfile, FinishStatus, GateConfig, MediaTime, Mp4Sink, MuxError, Sample,
    StatusLog,
};

fn assert_mp4(path: &std::path::Path) {
    let data = std::fs::read(path).expect("Read output file");
    assert!(data.len() >= 8, "File too small");
    assert_eq!(&data[4..8], b"ftyp", "Should have ftyp box");
    assert!(data.windows(4).any(|w| w == b"moov"), "Should have moov box");
    assert!(data.windows(4).any(|w| w == b"mdat"), "Should have mdat box");
}

/// Test: leading audio and duplicate frames still produce a valid file
#[test]
fn test_gated_recording_produces_valid_mp4() {
    let dir = tempdir().expect("Create temp dir");
    let output = dir.path().join("gated.mp4");
    let profile = CaptureProfile::default();

    let schedule = SyntheticSchedule::for_profile(&profile, Duration::from_millis(990))
        .with_duplicates(5);
    let samples = encoded_samples(&schedule, &profile).expect("Encode synthetic capture");

    let status = StatusLog::new();
    let sink = Mp4Sink::new(&output, profile.quality).with_title("gated");
    let mut recorder = Recorder::new(sink, GateConfig::default(), status.clone());
    recorder.start().expect("Start recording");

    let mut low_delta = 0;
    for sample in samples {
        match recorder.push(sample).expect("Push sample") {
            Admission::DroppedLowDelta => low_delta += 1,
            Admission::WriteFailed => panic!("muxer rejected a gated sample"),
            _ => {}
        }
    }
    assert_eq!(low_delta, 6, "every duplicate should be held back");

    let mut finished = None;
    recorder.stop(|s| finished = Some(s)).expect("Stop recording");
    assert_eq!(finished, Some(FinishStatus::Completed), "{}", status.render());

    let stats = recorder.stats();
    assert_eq!(stats.video_admitted, 30);
    assert!(stats.audio_admitted > 0);
    assert!(stats.bytes_written > 0);
    assert!(stats.duration_secs > 0.5);
    assert_eq!(
        stats.output_path.as_deref(),
        Some(output.to_string_lossy().as_ref())
    );
    assert_mp4(&output);
}

/// Test: recording through the serial admission thread
#[test]
fn test_queued_recording_produces_valid_mp4() {
    let dir = tempdir().expect("Create temp dir");
    let output = dir.path().join("queued.mp4");
    let profile = CaptureProfile::default();

    let schedule = SyntheticSchedule::for_profile(&profile, Duration::from_millis(490));
    let samples = encoded_samples(&schedule, &profile).expect("Encode synthetic capture");
    let total = samples.len();

    let mut recorder = Recorder::new(
        Mp4Sink::new(&output, profile.quality).with_fast_start(false),
        GateConfig::default(),
        StatusLog::new(),
    );
    recorder.start().expect("Start recording");
    let queue = CaptureQueue::spawn(recorder, total).expect("Spawn queue");
    for sample in samples {
        queue.push(sample).expect("Push sample");
    }

    // stop discards whatever is still queued; give the worker time to drain
    std::thread::sleep(Duration::from_millis(500));
    let outcome = queue
        .stop()
        .wait_timeout(Duration::from_secs(30))
        .expect("Recording outcome");

    assert!(outcome.status.is_completed(), "{:?}", outcome.status);
    assert!(outcome.stats.video_admitted > 0);
    assert_mp4(&output);
}

/// Test: an unwritable destination fails at start, not later
#[test]
fn test_start_failure_is_reported() {
    let dir = tempdir().expect("Create temp dir");
    let output = dir.path().join("missing").join("out.mp4");

    let status = StatusLog::new();
    let mut recorder = Recorder::new(
        Mp4Sink::new(&output, RecordingQuality::Medium),
        GateConfig::default(),
        status.clone(),
    );

    assert!(matches!(recorder.start(), Err(MuxError::StartFailed(_))));
    assert!(status.contains("Asset writer failed to start"));
    assert!(!output.exists());
}

/// Test: a payload the muxer cannot parse is a write failure, not a crash
#[test]
fn test_malformed_audio_is_write_failure() {
    let dir = tempdir().expect("Create temp dir");
    let output = dir.path().join("malformed.mp4");
    let profile = CaptureProfile::default();

    let schedule = SyntheticSchedule::for_profile(&profile, Duration::from_millis(30))
        .with_audio_lead(Duration::ZERO);
    let samples = encoded_samples(&schedule, &profile).expect("Encode synthetic capture");
    let first_frame = samples
        .into_iter()
        .find(|s| s.track == muxgate::Track::Video)
        .expect("one video frame");

    let mut recorder = Recorder::new(
        Mp4Sink::new(&output, profile.quality),
        GateConfig::default(),
        StatusLog::new(),
    );
    recorder.start().expect("Start recording");

    assert_eq!(recorder.push(first_frame).unwrap(), Admission::Admitted);
    assert_eq!(
        recorder
            .push(Sample::audio(MediaTime::from_millis(10), vec![0x12u8, 0x34, 0x56]))
            .unwrap(),
        Admission::WriteFailed
    );

    let packet = silent_aac_packet(&profile.quality.audio_settings()).expect("ADTS packet");
    assert_eq!(
        recorder
            .push(Sample::audio(MediaTime::from_millis(20), packet))
            .unwrap(),
        Admission::Admitted
    );

    recorder.stop(|_| {}).expect("Stop recording");
    assert_eq!(recorder.stats().write_failures, 1);
}
