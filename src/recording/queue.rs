//! Serial admission context
//!
//! Capture callbacks may fire on any thread. [`CaptureQueue`] funnels both
//! tracks through one bounded channel into a single worker thread that owns
//! the [`Recorder`], so the session gate and the per-track state are only
//! ever touched from one place.
//!
//! Backpressure is upstream: a full queue drops the sample at `push` time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use super::config::RecordingStats;
use super::recorder::{Recorder, RecordingState};
use crate::errors::MuxError;
use crate::types::Sample;
use crate::writer::{FinishStatus, MediaSink};

/// Default number of samples buffered between the source and the gate
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

enum Command {
    Sample(Sample),
    Stop,
}

/// Final report of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingOutcome {
    pub status: FinishStatus,
    pub stats: RecordingStats,
}

pub struct CaptureQueue {
    sender: Sender<Command>,
    accepting: Arc<AtomicBool>,
    overflows: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
    completion: Option<Receiver<RecordingOutcome>>,
}

impl CaptureQueue {
    /// Move a started recorder onto its own admission thread
    pub fn spawn<S>(recorder: Recorder<S>, capacity: usize) -> Result<Self, MuxError>
    where
        S: MediaSink + Send + 'static,
    {
        if recorder.state() != &RecordingState::Capturing {
            return Err(MuxError::InvalidState(format!(
                "recorder must be capturing before it is queued, was {:?}",
                recorder.state()
            )));
        }

        let (sender, receiver) = crossbeam_channel::bounded(capacity.max(1));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let accepting = Arc::new(AtomicBool::new(true));
        let overflows = Arc::new(AtomicU64::new(0));

        let worker_accepting = accepting.clone();
        let worker_overflows = overflows.clone();
        let worker = std::thread::Builder::new()
            .name("muxgate-admission".to_string())
            .spawn(move || {
                admission_loop(recorder, receiver, done_tx, worker_accepting, worker_overflows)
            })
            .map_err(|e| MuxError::InvalidState(format!("spawn failed: {e}")))?;

        Ok(Self {
            sender,
            accepting,
            overflows,
            worker: Some(worker),
            completion: Some(done_rx),
        })
    }

    /// Hand a sample to the admission thread without blocking
    pub fn push(&self, sample: Sample) -> Result<(), MuxError> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(MuxError::NotCapturing);
        }

        match self.sender.try_send(Command::Sample(sample)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.overflows.fetch_add(1, Ordering::Relaxed);
                Err(MuxError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(MuxError::NotCapturing),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    pub fn overflows(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Halt admission now and finish the file in the background
    ///
    /// Samples still queued are discarded. The returned handle delivers the
    /// outcome to whichever thread waits on it.
    pub fn stop(mut self) -> CompletionHandle {
        self.accepting.store(false, Ordering::Release);
        if self.sender.send(Command::Stop).is_err() {
            log::warn!("Admission thread exited before stop was requested");
        }

        CompletionHandle {
            receiver: self.completion.take(),
            worker: self.worker.take(),
        }
    }
}

impl Drop for CaptureQueue {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.accepting.store(false, Ordering::Release);
            let _ = self.sender.send(Command::Stop);
            let _ = worker.join();
        }
    }
}

fn admission_loop<S: MediaSink>(
    mut recorder: Recorder<S>,
    receiver: Receiver<Command>,
    done: Sender<RecordingOutcome>,
    accepting: Arc<AtomicBool>,
    overflows: Arc<AtomicU64>,
) {
    let mut discarded = 0u64;

    for command in receiver.iter() {
        match command {
            Command::Sample(sample) => {
                if !accepting.load(Ordering::Acquire) {
                    discarded += 1;
                    continue;
                }
                if let Err(e) = recorder.push(sample) {
                    log::debug!("Sample not offered: {}", e);
                }
            }
            Command::Stop => {
                let mut finished = None;
                if let Err(e) = recorder.stop(|status| finished = Some(status)) {
                    log::warn!("Stop failed: {}", e);
                }
                let status = finished
                    .unwrap_or_else(|| FinishStatus::Failed("recording was not capturing".to_string()));

                let mut stats = recorder.stats();
                stats.queue_overflows = overflows.load(Ordering::Relaxed);
                stats.discarded_after_stop = discarded;

                let _ = done.send(RecordingOutcome { status, stats });
                return;
            }
        }
    }
}

/// Delivers the outcome of a stopped recording exactly once
pub struct CompletionHandle {
    receiver: Option<Receiver<RecordingOutcome>>,
    worker: Option<JoinHandle<()>>,
}

impl CompletionHandle {
    /// Block until the file is finalized
    pub fn wait(self) -> Result<RecordingOutcome, MuxError> {
        self.wait_inner(None)
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<RecordingOutcome, MuxError> {
        self.wait_inner(Some(timeout))
    }

    /// Wait, then run `callback` on the calling thread
    pub fn on_complete<F>(self, callback: F) -> Result<(), MuxError>
    where
        F: FnOnce(RecordingOutcome),
    {
        let outcome = self.wait()?;
        callback(outcome);
        Ok(())
    }

    fn wait_inner(mut self, timeout: Option<Duration>) -> Result<RecordingOutcome, MuxError> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| MuxError::InvalidState("completion already consumed".to_string()))?;

        let outcome = match timeout {
            None => receiver
                .recv()
                .map_err(|_| MuxError::InvalidState("admission thread exited".to_string()))?,
            Some(timeout) => match receiver.recv_timeout(timeout) {
                Ok(outcome) => outcome,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(MuxError::InvalidState("timed out waiting for finish".to_string()))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(MuxError::InvalidState("admission thread exited".to_string()))
                }
            },
        };

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        Ok(outcome)
    }
}
