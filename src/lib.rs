//! Godot Camera Plugin Core
//!
//! Camera capture for a game engine's Android runtime: opens a device,
//! configures its preview, converts every YUV 4:2:0 preview frame into
//! packed RGBA and hands it to the scripting layer as a deferred event.
//!
//! # Architecture
//!
//! ```text
//! plugin (method table) → session → device (backend trait)
//!                            ↓            ↓ raw frames
//!                         dispatch ← convert (buffers + kernel)
//! ```
//!
//! # Design Principles
//!
//! - **Caller never fails**: platform errors become `_on_exception` events
//! - **Closed means inert**: without an open camera, calls are no-ops and
//!   queries return sentinels
//! - **Allocate once**: conversion buffers are sized when capture starts
//!   and reused for every frame
//!
//! # Example
//!
//! ```no_run
//! use godot_camera::{
//!     device::MockBackend,
//!     dispatch::{CameraEvent, ChannelSink},
//!     plugin::GodotCamera,
//!     session::CameraSession,
//! };
//! use std::sync::Arc;
//!
//! let backend = MockBackend::new(1);
//! let (sink, events) = ChannelSink::new();
//! let mut camera = GodotCamera::new(CameraSession::new(backend.clone(), Arc::new(sink)));
//!
//! camera.set_callback_object(1234);
//! if camera.initialize_camera(0) == 1 {
//!     camera.set_preview_size(640, 480);
//!     camera.initialize_capture();
//! }
//!
//! backend.deliver_synthetic(0);
//! if let Ok(dispatch) = events.try_recv() {
//!     if let CameraEvent::CapturedData { width, height, .. } = dispatch.event {
//!         println!("frame {}x{}", width, height);
//!     }
//! }
//! camera.finalize_capture();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod convert;
pub mod device;
pub mod dispatch;
pub mod metrics;
pub mod plugin;
pub mod session;

// Re-export commonly used types at crate root
pub use config::PluginConfig;
pub use convert::{ConversionKernel, ConversionPipeline, KernelKind, RgbaFrame, YuvLayout};
pub use device::{CameraBackend, CameraDevice, DeviceError, MockBackend, PreviewParameters};
pub use dispatch::{CameraEvent, ChannelSink, EventSink, ReceiverId};
pub use plugin::{GodotCamera, Variant};
pub use session::{CameraSession, SessionState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
