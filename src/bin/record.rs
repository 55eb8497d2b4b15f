// muxgate record demo
// Records a synthetic camera and microphone through the admission gate into
// an MP4 file. Stops after five seconds or on Ctrl-C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use muxgate::device::apply_profile;
use muxgate::recording::{CaptureQueue, Recorder};
use muxgate::testing::{encoded_samples, SyntheticDevices, SyntheticSchedule};
use muxgate::{CaptureClock, MuxError, MuxGateConfig, Mp4Sink, StatusLog};

const MAX_RECORDING: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    muxgate::init_logging();

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    let config = MuxGateConfig::load_or_default();
    let profile = config.capture_profile();
    let status = StatusLog::new();

    println!("muxgate {} record demo", muxgate::VERSION);
    println!(
        "camera: {:?}, microphone: {}, quality: {}",
        profile.camera,
        profile.microphone,
        profile.quality.as_str()
    );

    let mut devices = SyntheticDevices::new();
    let report = apply_profile(&mut devices, &profile, &status);
    if !report.camera_ready {
        status.warn("No camera configured, the session will never start");
    }

    println!("Encoding synthetic capture...");
    let schedule = SyntheticSchedule::for_profile(&profile, MAX_RECORDING)
        .with_duplicates(45)
        .with_jitter(Duration::from_millis(2));
    let samples = encoded_samples(&schedule, &profile).context("synthetic encode failed")?;

    let output = config.output_path();
    let mut sink = Mp4Sink::new(&output, profile.quality).with_fast_start(config.output.fast_start);
    if let Some(title) = &config.output.title {
        sink = sink.with_title(title.clone());
    }

    let mut recorder = Recorder::new(sink, config.gate_config(), status.clone());
    recorder.start().context("recording did not start")?;
    let queue = CaptureQueue::spawn(recorder, config.gate.queue_capacity)?;

    println!("Recording to {} (Ctrl-C to stop)", output.display());

    // replay in real time, the first sample arriving now
    let first = samples.first().map(|s| s.timestamp).unwrap_or_default();
    let clock = CaptureClock::new();
    for sample in samples {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let ahead = sample.timestamp.since(first).as_nanos() - clock.now().as_nanos();
        if ahead > 0 {
            std::thread::sleep(Duration::from_nanos(ahead as u64));
        }

        match queue.push(sample) {
            Ok(()) | Err(MuxError::QueueFull) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let outcome = queue
        .stop()
        .wait_timeout(Duration::from_secs(30))
        .context("recording did not finish")?;

    println!("\nStatus log:");
    println!("{}", status.render());
    println!("\nOutcome: {:?}", outcome.status);
    println!("{}", serde_json::to_string_pretty(&outcome.stats)?);

    if !outcome.status.is_completed() {
        anyhow::bail!("recording failed: {:?}", outcome.status);
    }
    Ok(())
}
