//! The method surface exposed to the engine's scripting layer.
//!
//! The engine binds plugin methods by name and passes loosely typed
//! arguments. [`GodotCamera`] offers both typed methods and a by-name
//! [`call`](GodotCamera::call) dispatcher over [`Variant`] values, with
//! the integer-coded results scripts expect.

use crate::dispatch::ReceiverId;
use crate::session::CameraSession;
use thiserror::Error;

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "GodotCamera";

/// Methods callable from scripts.
pub const PLUGIN_METHODS: &[&str] = &[
    "init",
    "setCallbackObject",
    "initializeCamera",
    "initializeCapture",
    "finalizeCapture",
    "getCameraCount",
    "setPreviewSize",
    "setPreviewFormat",
    "getPreviewSize",
    "getPreviewFramerate",
    "getPreviewFormat",
    "getSupportedPreviewFormats",
];

/// Loosely typed value crossing the scripting boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    Nil,
    Int(i64),
    IntArray(Vec<i64>),
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(i64::from(value))
    }
}

impl From<Vec<i32>> for Variant {
    fn from(values: Vec<i32>) -> Self {
        Variant::IntArray(values.into_iter().map(i64::from).collect())
    }
}

/// Errors raised by the binding layer itself.
///
/// Camera failures never surface here; they become exception events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("{method} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        method: String,
        expected: usize,
        got: usize,
    },
    #[error("argument {index} of {method} must be an integer")]
    ArgumentType { method: String, index: usize },
    #[error("argument {index} of {method} is out of range: {value}")]
    OutOfRange {
        method: String,
        index: usize,
        value: i64,
    },
}

fn expect_args(method: &str, args: &[Variant], expected: usize) -> Result<(), PluginError> {
    if args.len() != expected {
        return Err(PluginError::ArgumentCount {
            method: method.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn int_arg(method: &str, args: &[Variant], index: usize) -> Result<i64, PluginError> {
    match args.get(index) {
        Some(Variant::Int(value)) => Ok(*value),
        _ => Err(PluginError::ArgumentType {
            method: method.to_string(),
            index,
        }),
    }
}

fn i32_arg(method: &str, args: &[Variant], index: usize) -> Result<i32, PluginError> {
    let value = int_arg(method, args, index)?;
    i32::try_from(value).map_err(|_| PluginError::OutOfRange {
        method: method.to_string(),
        index,
        value,
    })
}

/// Camera plugin instance.
pub struct GodotCamera {
    session: CameraSession,
}

impl GodotCamera {
    pub fn new(session: CameraSession) -> Self {
        Self { session }
    }

    pub fn plugin_name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn plugin_methods(&self) -> &'static [&'static str] {
        PLUGIN_METHODS
    }

    pub fn session(&self) -> &CameraSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CameraSession {
        &mut self.session
    }

    /// Accepted for compatibility with older engine bindings; does nothing.
    pub fn init(&mut self, _script_id: i64) {}

    pub fn set_callback_object(&mut self, receiver: ReceiverId) {
        self.session.set_receiver(receiver);
    }

    /// Returns 1 on success, 0 on failure.
    pub fn initialize_camera(&mut self, index: i32) -> i32 {
        i32::from(self.session.open(index))
    }

    pub fn initialize_capture(&mut self) {
        self.session.start_capture();
    }

    pub fn finalize_capture(&mut self) {
        self.session.stop_capture();
    }

    pub fn get_camera_count(&self) -> i32 {
        self.session.device_count()
    }

    /// Negative dimensions are rejected like any other unsupported size.
    pub fn set_preview_size(&mut self, width: i32, height: i32) {
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(width), Ok(height)) => self.session.set_preview_size(width, height),
            _ => tracing::warn!(width, height, "Preview size rejected"),
        }
    }

    pub fn set_preview_format(&mut self, format: i32) {
        self.session.set_preview_format(format);
    }

    pub fn get_preview_size(&self) -> [i32; 2] {
        let (width, height) = self.session.preview_size();
        [
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        ]
    }

    pub fn get_preview_framerate(&self) -> i32 {
        self.session.preview_frame_rate()
    }

    pub fn get_preview_format(&self) -> i32 {
        self.session.preview_format()
    }

    pub fn get_supported_preview_formats(&self) -> Vec<i32> {
        self.session.supported_preview_formats()
    }

    /// Invokes a plugin method by name.
    pub fn call(&mut self, method: &str, args: &[Variant]) -> Result<Variant, PluginError> {
        tracing::trace!(method, args = args.len(), "Plugin call");
        match method {
            "init" => {
                expect_args(method, args, 1)?;
                self.init(int_arg(method, args, 0)?);
                Ok(Variant::Nil)
            }
            "setCallbackObject" => {
                expect_args(method, args, 1)?;
                self.set_callback_object(int_arg(method, args, 0)?);
                Ok(Variant::Nil)
            }
            "initializeCamera" => {
                expect_args(method, args, 1)?;
                let index = i32_arg(method, args, 0)?;
                Ok(self.initialize_camera(index).into())
            }
            "initializeCapture" => {
                expect_args(method, args, 0)?;
                self.initialize_capture();
                Ok(Variant::Nil)
            }
            "finalizeCapture" => {
                expect_args(method, args, 0)?;
                self.finalize_capture();
                Ok(Variant::Nil)
            }
            "getCameraCount" => {
                expect_args(method, args, 0)?;
                Ok(self.get_camera_count().into())
            }
            "setPreviewSize" => {
                expect_args(method, args, 2)?;
                let width = i32_arg(method, args, 0)?;
                let height = i32_arg(method, args, 1)?;
                self.set_preview_size(width, height);
                Ok(Variant::Nil)
            }
            "setPreviewFormat" => {
                expect_args(method, args, 1)?;
                self.set_preview_format(i32_arg(method, args, 0)?);
                Ok(Variant::Nil)
            }
            "getPreviewSize" => {
                expect_args(method, args, 0)?;
                Ok(self.get_preview_size().to_vec().into())
            }
            "getPreviewFramerate" => {
                expect_args(method, args, 0)?;
                Ok(self.get_preview_framerate().into())
            }
            "getPreviewFormat" => {
                expect_args(method, args, 0)?;
                Ok(self.get_preview_format().into())
            }
            "getSupportedPreviewFormats" => {
                expect_args(method, args, 0)?;
                Ok(self.get_supported_preview_formats().into())
            }
            other => Err(PluginError::UnknownMethod(other.to_string())),
        }
    }
}

impl std::fmt::Debug for GodotCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GodotCamera")
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{format, MockBackend};
    use crate::dispatch::ChannelSink;
    use std::sync::Arc;

    fn plugin() -> (GodotCamera, MockBackend) {
        let backend = MockBackend::new(1);
        let (sink, _rx) = ChannelSink::new();
        let session = CameraSession::new(backend.clone(), Arc::new(sink));
        (GodotCamera::new(session), backend)
    }

    #[test]
    fn test_method_table_is_dispatchable() {
        let (mut plugin, _backend) = plugin();
        assert_eq!(plugin.plugin_name(), "GodotCamera");
        for method in plugin.plugin_methods() {
            let result = plugin.call(method, &[]);
            assert!(
                !matches!(result, Err(PluginError::UnknownMethod(_))),
                "{method} not dispatched"
            );
        }
    }

    #[test]
    fn test_integer_coded_results() {
        let (mut plugin, _backend) = plugin();

        assert_eq!(plugin.call("getCameraCount", &[]), Ok(Variant::Int(-1)));
        assert_eq!(
            plugin.call("getPreviewSize", &[]),
            Ok(Variant::IntArray(vec![0, 0]))
        );
        assert_eq!(
            plugin.call("getSupportedPreviewFormats", &[]),
            Ok(Variant::IntArray(vec![0]))
        );

        assert_eq!(
            plugin.call("initializeCamera", &[Variant::Int(3)]),
            Ok(Variant::Int(0))
        );
        assert_eq!(
            plugin.call("initializeCamera", &[Variant::Int(0)]),
            Ok(Variant::Int(1))
        );
        assert_eq!(plugin.call("getCameraCount", &[]), Ok(Variant::Int(1)));
        assert_eq!(
            plugin.call("getPreviewFormat", &[]),
            Ok(Variant::Int(i64::from(format::NV21)))
        );
    }

    #[test]
    fn test_set_preview_size_by_name() {
        let (mut plugin, backend) = plugin();
        plugin.initialize_camera(0);

        plugin
            .call("setPreviewSize", &[Variant::Int(320), Variant::Int(240)])
            .unwrap();
        assert_eq!(plugin.get_preview_size(), [320, 240]);

        plugin.set_preview_size(-1, 240);
        assert_eq!(backend.parameters().width, 320);
    }

    #[test]
    fn test_unrepresentable_values_saturate() {
        let backend = MockBackend::new(usize::MAX);
        let (sink, _rx) = ChannelSink::new();
        let mut plugin = GodotCamera::new(CameraSession::new(backend, Arc::new(sink)));
        assert_eq!(plugin.initialize_camera(0), 1);
        assert_eq!(plugin.get_camera_count(), i32::MAX);

        plugin.session_mut().set_preview_size(u32::MAX - 1, 480);
        assert_eq!(plugin.get_preview_size(), [i32::MAX, 480]);
    }

    #[test]
    fn test_binding_errors() {
        let (mut plugin, _backend) = plugin();

        assert_eq!(
            plugin.call("takePicture", &[]),
            Err(PluginError::UnknownMethod("takePicture".into()))
        );
        assert!(matches!(
            plugin.call("setPreviewSize", &[Variant::Int(1)]),
            Err(PluginError::ArgumentCount { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            plugin.call("setCallbackObject", &[Variant::Nil]),
            Err(PluginError::ArgumentType { index: 0, .. })
        ));
        assert!(matches!(
            plugin.call("initializeCamera", &[Variant::Int(i64::MAX)]),
            Err(PluginError::OutOfRange { .. })
        ));
    }
}
