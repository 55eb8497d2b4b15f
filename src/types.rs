use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timing::MediaTime;

/// The two tracks of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Audio,
    Video,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Audio, Track::Video];

    pub(crate) fn index(self) -> usize {
        match self {
            Track::Audio => 0,
            Track::Video => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Audio => "audio",
            Track::Video => "video",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured media sample
///
/// The payload is opaque to the gate; sinks interpret it (H.264 Annex B for
/// video and ADTS-framed AAC for audio in the MP4 sink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub track: Track,
    pub timestamp: MediaTime,
    pub payload: Bytes,
}

impl Sample {
    pub fn new(track: Track, timestamp: MediaTime, payload: impl Into<Bytes>) -> Self {
        Self {
            track,
            timestamp,
            payload: payload.into(),
        }
    }

    pub fn video(timestamp: MediaTime, payload: impl Into<Bytes>) -> Self {
        Self::new(Track::Video, timestamp, payload)
    }

    pub fn audio(timestamp: MediaTime, payload: impl Into<Bytes>) -> Self {
        Self::new(Track::Audio, timestamp, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_constructors() {
        let sample = Sample::video(MediaTime::from_millis(5), vec![1u8, 2, 3]);
        assert_eq!(sample.track, Track::Video);
        assert_eq!(sample.payload.len(), 3);

        let sample = Sample::audio(MediaTime::ZERO, Bytes::from_static(b"aac"));
        assert_eq!(sample.track, Track::Audio);
    }

    #[test]
    fn test_track_index_distinct() {
        assert_ne!(Track::Audio.index(), Track::Video.index());
        assert_eq!(Track::Video.to_string(), "video");
    }
}
