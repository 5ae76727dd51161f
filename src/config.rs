//! Plugin configuration.
//!
//! Loaded from a TOML file by the demo binary; every section is optional
//! and falls back to the camera defaults (VGA NV21 from device 0).

use crate::convert::KernelKind;
use crate::device::format;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which camera to open and how to configure its preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index.
    pub device_index: i32,
    /// Preview width in pixels.
    pub preview_width: u32,
    /// Preview height in pixels.
    pub preview_height: u32,
    /// Preview pixel format code.
    pub preview_format: i32,
    /// Receiver id events are addressed to.
    pub receiver_id: i64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            preview_width: 640,
            preview_height: 480,
            preview_format: format::NV21,
            receiver_id: 0,
        }
    }
}

impl CameraConfig {
    /// Creates a new configuration with the specified preview size.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            preview_width: width,
            preview_height: height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_index < 0 {
            return Err(ConfigError::InvalidDeviceIndex(self.device_index));
        }
        if self.preview_width == 0
            || self.preview_height == 0
            || self.preview_width % 2 != 0
            || self.preview_height % 2 != 0
        {
            return Err(ConfigError::InvalidDimensions);
        }
        Ok(())
    }
}

/// Conversion kernel selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Kernel implementation.
    pub kernel: KernelKind,
    /// Worker threads for the threaded kernel (0 = one per core).
    pub threads: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Software,
            threads: 0,
        }
    }
}

/// Demo run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run until interrupted (true) or stop after `frame_count` frames.
    pub continuous: bool,
    /// Number of frames to receive if not continuous.
    pub frame_count: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 30,
            metrics_port: 0,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid device index {0}")]
    InvalidDeviceIndex(i32),
    #[error("invalid preview dimensions (must be non-zero and even)")]
    InvalidDimensions,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PluginConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl PluginConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: PluginConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.camera.validate()?;
        Ok(config)
    }
}
