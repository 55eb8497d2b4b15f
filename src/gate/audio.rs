use super::{Admission, SessionGate};
use crate::types::{Sample, Track};
use crate::writer::{ContainerWriter, MediaSink};

/// Audio admission: waits for video to open the session
///
/// Audio usually starts flowing well before the first camera frame; the
/// container origin is defined by video, so earlier audio is discarded.
/// Audio order is trusted from the source.
#[derive(Debug, Clone, Default)]
pub struct AudioAdmission;

impl AudioAdmission {
    pub fn new() -> Self {
        Self
    }

    pub fn admit<S: MediaSink>(
        &mut self,
        sample: &Sample,
        session: &SessionGate,
        writer: &mut ContainerWriter<S>,
    ) -> Admission {
        debug_assert_eq!(sample.track, Track::Audio);

        if !writer.is_ready(Track::Audio) {
            return Admission::DroppedNotReady;
        }
        if !session.is_started() {
            return Admission::DroppedSessionNotStarted;
        }
        if !writer.append(Track::Audio, sample) {
            return Admission::WriteFailed;
        }
        Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::VideoAdmission;
    use crate::timing::MediaTime;
    use crate::writer::MemorySink;
    use std::time::Duration;

    fn writer() -> (ContainerWriter<MemorySink>, MemorySink) {
        let sink = MemorySink::new();
        let mut writer = ContainerWriter::new(sink.clone());
        writer.start_writing().unwrap();
        (writer, sink)
    }

    #[test]
    fn test_audio_waits_for_video() {
        let (mut writer, sink) = writer();
        let mut session = SessionGate::new();
        let mut audio = AudioAdmission::new();
        let mut video = VideoAdmission::new(Duration::from_millis(15));

        let early = Sample::audio(MediaTime::from_millis(-10), vec![1u8; 4]);
        assert_eq!(
            audio.admit(&early, &session, &mut writer),
            Admission::DroppedSessionNotStarted
        );

        let first = Sample::video(MediaTime::ZERO, vec![0u8; 8]);
        assert_eq!(video.admit(&first, &mut session, &mut writer), Admission::Admitted);

        let late = Sample::audio(MediaTime::from_millis(10), vec![1u8; 4]);
        assert_eq!(audio.admit(&late, &session, &mut writer), Admission::Admitted);
        assert_eq!(sink.written_on(Track::Audio), vec![MediaTime::from_millis(10)]);
    }

    #[test]
    fn test_readiness_checked_before_session() {
        let (mut writer, sink) = writer();
        sink.set_ready(Track::Audio, false);
        let session = SessionGate::new();

        let sample = Sample::audio(MediaTime::ZERO, vec![1u8]);
        assert_eq!(
            AudioAdmission::new().admit(&sample, &session, &mut writer),
            Admission::DroppedNotReady
        );
    }

    #[test]
    fn test_no_delta_check_for_audio() {
        let (mut writer, _sink) = writer();
        let mut session = SessionGate::new();
        session.try_start(MediaTime::ZERO);
        writer.start_session(MediaTime::ZERO).unwrap();
        let mut audio = AudioAdmission::new();

        for _ in 0..3 {
            let dup = Sample::audio(MediaTime::from_millis(5), vec![1u8]);
            assert_eq!(audio.admit(&dup, &session, &mut writer), Admission::Admitted);
        }
    }

    #[test]
    fn test_write_failure() {
        let (mut writer, sink) = writer();
        let mut session = SessionGate::new();
        session.try_start(MediaTime::ZERO);
        writer.start_session(MediaTime::ZERO).unwrap();
        sink.reject_appends(true);

        let sample = Sample::audio(MediaTime::from_millis(1), vec![1u8]);
        assert_eq!(
            AudioAdmission::new().admit(&sample, &session, &mut writer),
            Admission::WriteFailed
        );
    }
}
