//! Camera backend and device traits.
//!
//! The platform camera is an external collaborator. These traits are the
//! seam where a real binding (or the mock used in tests) plugs in.

use super::PreviewParameters;
use thiserror::Error;

/// Errors reported by a camera backend or an open device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("no camera at index {index} ({count} available)")]
    InvalidIndex { index: i32, count: usize },
    #[error("camera {0} is in use by another client")]
    Busy(i32),
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("failed to connect to camera service: {0}")]
    OpenFailed(String),
    #[error("failed to bind preview target: {0}")]
    PreviewTarget(String),
    #[error("setParameters failed: {0}")]
    UnsupportedParameter(String),
    #[error("failed to start preview: {0}")]
    StartFailed(String),
    #[error("camera has been released")]
    Released,
}

/// Invoked by the device once per raw preview frame.
///
/// Frames arrive serially on the device's delivery thread.
pub type FrameCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Destination the device renders its preview into.
///
/// Streaming requires a bound target even when nothing is displayed, so
/// the plugin binds an offscreen texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTarget {
    /// Texture object name the preview is attached to.
    pub texture_name: u32,
}

impl PreviewTarget {
    /// An offscreen target that is never presented.
    pub fn offscreen() -> Self {
        Self { texture_name: 0 }
    }
}

/// An open, exclusively held camera device.
pub trait CameraDevice: Send {
    /// Index the device was opened with.
    fn index(&self) -> i32;

    /// Returns a copy of the current parameter set.
    fn parameters(&self) -> PreviewParameters;

    /// Applies a full parameter set. On error the previous set stays in effect.
    fn set_parameters(&mut self, params: &PreviewParameters) -> Result<(), DeviceError>;

    /// Binds the surface that preview frames are rendered to.
    fn set_preview_target(&mut self, target: PreviewTarget) -> Result<(), DeviceError>;

    /// Installs (or clears) the per-frame callback.
    fn set_frame_callback(&mut self, callback: Option<FrameCallback>);

    /// Begins streaming frames to the installed callback.
    fn start_preview(&mut self) -> Result<(), DeviceError>;

    /// Stops streaming. Does nothing if not streaming.
    fn stop_preview(&mut self);

    /// Releases the device so other clients can open it. Idempotent.
    fn release(&mut self);
}

/// Source of camera devices.
pub trait CameraBackend: Send {
    /// Number of cameras present on the system.
    fn device_count(&self) -> usize;

    /// Acquires exclusive access to the camera at `index`.
    fn open(&mut self, index: i32) -> Result<Box<dyn CameraDevice>, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DeviceError::InvalidIndex { index: 3, count: 2 };
        assert_eq!(err.to_string(), "no camera at index 3 (2 available)");

        let err = DeviceError::Busy(0);
        assert_eq!(err.to_string(), "camera 0 is in use by another client");
    }

    #[test]
    fn test_offscreen_target() {
        assert_eq!(PreviewTarget::offscreen().texture_name, 0);
    }
}
