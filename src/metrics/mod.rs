//! Prometheus metrics for camera capture.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `godot_camera_sessions_opened_total` - Successful camera opens
//! - `godot_camera_exceptions_total` - Exception events reported
//! - `godot_camera_previewing` - Preview state (1=streaming, 0=stopped)
//!
//! ## Frame Metrics
//! - `godot_camera_frames_delivered_total` - Raw frames received
//! - `godot_camera_frames_converted_total` - Frames converted and dispatched
//! - `godot_camera_frame_size_mismatches_total` - Frames converted with stale buffers
//! - `godot_camera_capture_stale_frames` - Stale-buffer frames in the running capture
//!
//! ## Buffer Metrics
//! - `godot_camera_buffer_width` / `godot_camera_buffer_height` - Allocated buffer size
//!
//! # Example
//!
//! ```no_run
//! use godot_camera::metrics::CaptureMetrics;
//!
//! let metrics = CaptureMetrics::new().expect("Failed to create registry");
//! metrics.record_preview_started(640, 480);
//! println!("{}", metrics.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{CaptureMetrics, MetricsError, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{CaptureStatus, HealthReport, MetricsServer, ServerError};
