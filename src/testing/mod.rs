//! Testing utilities for muxgate
//!
//! Synthetic capture timelines and device backends for exercising the gate
//! and the writers without hardware.

pub mod synthetic_data;

#[cfg(feature = "recording")]
pub use synthetic_data::encoded_samples;
pub use synthetic_data::{
    adts_frame, silent_aac_packet, synthetic_video_frame, SyntheticDevices, SyntheticSchedule,
};
