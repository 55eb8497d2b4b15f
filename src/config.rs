//! Configuration management for muxgate
//!
//! Loads and saves the capture profile, gate tuning and output options as
//! TOML.

use crate::device::{CameraPosition, Microphone};
use crate::errors::MuxError;
use crate::gate::GateConfig;
use crate::recording::{CaptureProfile, RecordingQuality, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxGateConfig {
    pub capture: CaptureSection,
    pub gate: GateSection,
    pub output: OutputSection,
}

/// Which devices to use and at what quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSection {
    pub camera: CameraPosition,
    pub microphone: Microphone,
    pub quality: RecordingQuality,
}

/// Admission gate tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSection {
    /// Minimum spacing between admitted video frames, in milliseconds
    pub minimum_delta_ms: u64,
    /// Samples buffered between the source and the admission thread
    pub queue_capacity: usize,
}

/// Where and how the container is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Output directory; the system temp directory when unset
    pub directory: Option<String>,
    /// File extension of the container
    pub extension: String,
    /// Write the index before the media data
    pub fast_start: bool,
    /// Optional title metadata
    pub title: Option<String>,
}

impl Default for MuxGateConfig {
    fn default() -> Self {
        Self {
            capture: CaptureSection {
                camera: CameraPosition::Back,
                microphone: Microphone::Back,
                quality: RecordingQuality::Medium,
            },
            gate: GateSection {
                minimum_delta_ms: 15,
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
            },
            output: OutputSection {
                directory: None,
                extension: "mp4".to_string(),
                fast_start: true,
                title: None,
            },
        }
    }
}

impl MuxGateConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, MuxError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| MuxError::Config(format!("Failed to read config file: {}", e)))?;

        let config: MuxGateConfig = toml::from_str(&contents)
            .map_err(|e| MuxError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(MuxError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MuxError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MuxError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| MuxError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| MuxError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("muxgate.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.gate.minimum_delta_ms > 1_000 {
            return Err("Minimum delta must be at most 1000 ms".to_string());
        }
        if self.gate.queue_capacity == 0 {
            return Err("Queue capacity must be at least 1".to_string());
        }
        let extension = self.output.extension.trim_start_matches('.');
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("Invalid output extension: {:?}", self.output.extension));
        }
        Ok(())
    }

    pub fn capture_profile(&self) -> CaptureProfile {
        CaptureProfile::new(
            self.capture.camera,
            self.capture.microphone,
            self.capture.quality,
        )
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig::with_minimum_delta(Duration::from_millis(self.gate.minimum_delta_ms))
    }

    /// A fresh, unique output path for one recording
    pub fn output_path(&self) -> PathBuf {
        let extension = self.output.extension.trim_start_matches('.');
        match &self.output.directory {
            Some(dir) => unique_path_in(Path::new(dir), extension),
            None => temporary_output_path(extension),
        }
    }
}

/// Unique file path in the system temp directory
pub fn temporary_output_path(extension: &str) -> PathBuf {
    unique_path_in(&std::env::temp_dir(), extension)
}

fn unique_path_in(dir: &Path, extension: &str) -> PathBuf {
    dir.join(uuid::Uuid::new_v4().to_string())
        .with_extension(extension)
}
