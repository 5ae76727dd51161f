//! Events delivered to the registered receiver.

use crate::convert::RgbaFrame;

/// Opaque identifier of the scripting object that receives events.
pub type ReceiverId = i64;

/// Method invoked on the receiver for each converted frame.
pub const ON_CAPTURED_DATA: &str = "_on_captured_data";

/// Method invoked on the receiver for each reported failure.
pub const ON_EXCEPTION: &str = "_on_exception";

/// An event for the scripting layer.
#[derive(Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// One converted preview frame.
    CapturedData {
        rgba: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// A platform failure caught at the plugin boundary.
    Exception { message: String },
}

impl CameraEvent {
    /// Builds a captured-data event from a converted frame.
    pub fn captured(frame: RgbaFrame) -> Self {
        let (width, height) = (frame.width(), frame.height());
        CameraEvent::CapturedData {
            rgba: frame.into_pixels(),
            width,
            height,
        }
    }

    /// Builds an exception event from any displayable error.
    pub fn exception(err: impl std::fmt::Display) -> Self {
        CameraEvent::Exception {
            message: err.to_string(),
        }
    }

    /// Name of the receiver method this event calls.
    pub fn method_name(&self) -> &'static str {
        match self {
            CameraEvent::CapturedData { .. } => ON_CAPTURED_DATA,
            CameraEvent::Exception { .. } => ON_EXCEPTION,
        }
    }
}

impl std::fmt::Debug for CameraEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraEvent::CapturedData {
                rgba,
                width,
                height,
            } => f
                .debug_struct("CapturedData")
                .field("bytes", &rgba.len())
                .field("width", width)
                .field("height", height)
                .finish(),
            CameraEvent::Exception { message } => f
                .debug_struct("Exception")
                .field("message", message)
                .finish(),
        }
    }
}

/// An event addressed to a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub receiver: ReceiverId,
    pub event: CameraEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        let event = CameraEvent::exception("boom");
        assert_eq!(event.method_name(), ON_EXCEPTION);

        let frame = RgbaFrame::new(vec![0; 16], 2, 2, 1);
        let event = CameraEvent::captured(frame);
        assert_eq!(event.method_name(), ON_CAPTURED_DATA);
        assert!(matches!(
            event,
            CameraEvent::CapturedData { width: 2, height: 2, ref rgba } if rgba.len() == 16
        ));
    }

    #[test]
    fn test_debug_hides_pixels() {
        let event = CameraEvent::CapturedData {
            rgba: vec![7; 64],
            width: 4,
            height: 4,
        };
        let text = format!("{:?}", event);
        assert!(text.contains("bytes: 64"));
        assert!(!text.contains("7, 7"));
    }
}
