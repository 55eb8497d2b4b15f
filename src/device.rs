//! Camera and microphone selection
//!
//! The hardware side lives behind [`DeviceConfigurator`]. Configuration is a
//! precondition for samples to start flowing, nothing more: a failure is
//! reported to the status log and recording carries on without that input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::MuxError;
use crate::recording::CaptureProfile;
use crate::status::StatusLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    Back,
    None,
}

impl CameraPosition {
    /// Front camera output is mirrored so the preview reads naturally
    pub fn is_mirrored(&self) -> bool {
        matches!(self, CameraPosition::Front)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Microphone {
    Front,
    Back,
    Bottom,
    /// Leave the current input route untouched
    Ignore,
}

impl Microphone {
    /// Orientation of the input data source to select, if any
    pub fn orientation(&self) -> Option<&'static str> {
        match self {
            Microphone::Front => Some("front"),
            Microphone::Back => Some("back"),
            Microphone::Bottom => Some("bottom"),
            Microphone::Ignore => None,
        }
    }
}

impl fmt::Display for Microphone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.orientation().unwrap_or("default"))
    }
}

/// Hardware configuration backend
pub trait DeviceConfigurator {
    /// Select the camera and lock it to `frame_duration`, mirroring the
    /// output when [`CameraPosition::is_mirrored`] says so
    fn configure_camera(
        &mut self,
        camera: CameraPosition,
        frame_duration: Duration,
    ) -> Result<(), MuxError>;

    /// Route the speaker output and select the input data source
    fn route_audio(&mut self, microphone: Microphone) -> Result<(), MuxError>;
}

/// Which inputs ended up configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub camera_ready: bool,
    pub microphone_ready: bool,
}

/// Apply a capture profile, logging every failure
pub fn apply_profile(
    configurator: &mut dyn DeviceConfigurator,
    profile: &CaptureProfile,
    status: &StatusLog,
) -> DeviceReport {
    let microphone_ready = match configurator.route_audio(profile.microphone) {
        Ok(()) => true,
        Err(e) => {
            status.warn(format!("Failed to use {} microphone: {}", profile.microphone, e));
            false
        }
    };

    let camera_ready = match profile.camera {
        CameraPosition::None => false,
        camera => match configurator.configure_camera(camera, profile.frame_duration()) {
            Ok(()) => true,
            Err(e) => {
                status.warn(format!("Failed to set up camera: {}", e));
                false
            }
        },
    };

    DeviceReport {
        camera_ready,
        microphone_ready,
    }
}
