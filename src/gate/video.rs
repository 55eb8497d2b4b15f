use std::time::Duration;

use super::{Admission, SessionGate};
use crate::timing::MediaTime;
use crate::types::{Sample, Track};
use crate::writer::{ContainerWriter, MediaSink};

/// Video admission with a minimum spacing between written frames
///
/// Only the previously written frame is compared against, never a rate
/// estimate: one far-future frame holds back every frame behind it.
#[derive(Debug, Clone)]
pub struct VideoAdmission {
    minimum_delta: Duration,
    last_admitted: Option<MediaTime>,
}

impl VideoAdmission {
    pub fn new(minimum_delta: Duration) -> Self {
        Self {
            minimum_delta,
            last_admitted: None,
        }
    }

    pub fn admit<S: MediaSink>(
        &mut self,
        sample: &Sample,
        session: &mut SessionGate,
        writer: &mut ContainerWriter<S>,
    ) -> Admission {
        debug_assert_eq!(sample.track, Track::Video);

        if !writer.is_ready(Track::Video) {
            return Admission::DroppedNotReady;
        }

        if let Some(last) = self.last_admitted {
            if sample.timestamp - self.minimum_delta <= last {
                return Admission::DroppedLowDelta;
            }
        }

        if session.try_start(sample.timestamp) {
            if let Err(e) = writer.start_session(sample.timestamp) {
                log::warn!("Failed to start writer session: {}", e);
                return Admission::WriteFailed;
            }
        }

        if !writer.append(Track::Video, sample) {
            return Admission::WriteFailed;
        }

        self.last_admitted = Some(sample.timestamp);
        Admission::Admitted
    }

    pub fn last_admitted(&self) -> Option<MediaTime> {
        self.last_admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::MemorySink;

    fn setup() -> (VideoAdmission, SessionGate, ContainerWriter<MemorySink>, MemorySink) {
        let sink = MemorySink::new();
        let mut writer = ContainerWriter::new(sink.clone());
        writer.start_writing().unwrap();
        (
            VideoAdmission::new(Duration::from_millis(15)),
            SessionGate::new(),
            writer,
            sink,
        )
    }

    fn frame(ms: i64) -> Sample {
        Sample::video(MediaTime::from_millis(ms), vec![0u8; 8])
    }

    #[test]
    fn test_frame_spacing() {
        let (mut video, mut session, mut writer, sink) = setup();

        let results: Vec<_> = [0, 5, 20, 35, 36]
            .into_iter()
            .map(|ms| video.admit(&frame(ms), &mut session, &mut writer))
            .collect();

        assert_eq!(
            results,
            vec![
                Admission::Admitted,
                Admission::DroppedLowDelta,
                Admission::Admitted,
                Admission::DroppedLowDelta,
                Admission::Admitted,
            ]
        );
        assert_eq!(
            sink.written_on(Track::Video),
            vec![
                MediaTime::from_millis(0),
                MediaTime::from_millis(20),
                MediaTime::from_millis(36)
            ]
        );
    }

    #[test]
    fn test_exact_delta_is_dropped() {
        let (mut video, mut session, mut writer, _sink) = setup();
        video.admit(&frame(100), &mut session, &mut writer);

        assert_eq!(video.admit(&frame(115), &mut session, &mut writer), Admission::DroppedLowDelta);
        assert_eq!(video.admit(&frame(116), &mut session, &mut writer), Admission::Admitted);
    }

    #[test]
    fn test_first_frame_opens_session() {
        let (mut video, mut session, mut writer, sink) = setup();
        video.admit(&frame(250), &mut session, &mut writer);
        video.admit(&frame(300), &mut session, &mut writer);

        assert_eq!(session.origin(), Some(MediaTime::from_millis(250)));
        assert_eq!(writer.session_origin(), Some(MediaTime::from_millis(250)));
        assert_eq!(sink.origin(), Some(MediaTime::from_millis(250)));
    }

    #[test]
    fn test_not_ready_leaves_state() {
        let (mut video, mut session, mut writer, sink) = setup();
        video.admit(&frame(0), &mut session, &mut writer);

        sink.set_ready(Track::Video, false);
        assert_eq!(video.admit(&frame(100), &mut session, &mut writer), Admission::DroppedNotReady);
        assert_eq!(video.last_admitted(), Some(MediaTime::from_millis(0)));

        sink.set_ready(Track::Video, true);
        assert_eq!(video.admit(&frame(100), &mut session, &mut writer), Admission::Admitted);
    }

    #[test]
    fn test_not_ready_before_first_frame_keeps_session_closed() {
        let (mut video, mut session, mut writer, sink) = setup();
        sink.set_ready(Track::Video, false);

        assert_eq!(video.admit(&frame(0), &mut session, &mut writer), Admission::DroppedNotReady);
        assert!(!session.is_started());
        assert_eq!(video.last_admitted(), None);
    }

    #[test]
    fn test_write_failure_keeps_last_admitted() {
        let (mut video, mut session, mut writer, sink) = setup();
        video.admit(&frame(0), &mut session, &mut writer);

        sink.reject_appends(true);
        assert_eq!(video.admit(&frame(40), &mut session, &mut writer), Admission::WriteFailed);
        assert_eq!(video.last_admitted(), Some(MediaTime::from_millis(0)));

        sink.reject_appends(false);
        assert_eq!(video.admit(&frame(41), &mut session, &mut writer), Admission::Admitted);
    }

    #[test]
    fn test_failed_first_append_still_opens_session() {
        let (mut video, mut session, mut writer, sink) = setup();
        let mut audio = crate::gate::AudioAdmission::new();

        sink.reject_appends(true);
        assert_eq!(video.admit(&frame(0), &mut session, &mut writer), Admission::WriteFailed);
        assert_eq!(video.last_admitted(), None);
        sink.reject_appends(false);

        // the origin stays at the unwritten frame and audio flows from here on
        let early = Sample::audio(MediaTime::from_millis(5), vec![1u8]);
        assert_eq!(audio.admit(&early, &session, &mut writer), Admission::Admitted);
        assert_eq!(video.admit(&frame(33), &mut session, &mut writer), Admission::Admitted);

        assert_eq!(session.origin(), Some(MediaTime::from_millis(0)));
        assert_eq!(sink.origin(), Some(MediaTime::from_millis(0)));
        assert_eq!(video.last_admitted(), Some(MediaTime::from_millis(33)));
        let written: Vec<_> = sink
            .written()
            .into_iter()
            .map(|w| (w.track, w.timestamp))
            .collect();
        assert_eq!(
            written,
            vec![
                (Track::Audio, MediaTime::from_millis(5)),
                (Track::Video, MediaTime::from_millis(33))
            ]
        );
    }

    #[test]
    fn test_out_of_order_frame_holds_back_followers() {
        let (mut video, mut session, mut writer, _sink) = setup();
        video.admit(&frame(0), &mut session, &mut writer);
        // a stray frame far in the future
        video.admit(&frame(1_000), &mut session, &mut writer);

        for ms in (33..=990).step_by(33) {
            assert_eq!(video.admit(&frame(ms), &mut session, &mut writer), Admission::DroppedLowDelta);
        }
    }
}
