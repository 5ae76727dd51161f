//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Point-in-time copy of the capture metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful camera opens.
    pub sessions_opened: u64,
    /// Exception events reported to the receiver.
    pub exceptions_reported: u64,
    /// Raw frames received from the device.
    pub frames_delivered: u64,
    /// Frames converted and dispatched.
    pub frames_converted: u64,
    /// Frames whose size did not match the conversion buffers.
    pub size_mismatches: u64,
    /// Whether a preview is currently running.
    pub previewing: bool,
    /// Width the conversion buffers are bound to (0 when none).
    pub buffer_width: i64,
    /// Height the conversion buffers are bound to (0 when none).
    pub buffer_height: i64,
    /// Size mismatches since the running preview started.
    pub stale_frames: i64,
}

/// Prometheus metrics registry for camera capture.
///
/// Cheap to clone; clones share the same underlying metrics, so the
/// frame delivery thread can hold its own copy.
#[derive(Clone)]
pub struct CaptureMetrics {
    registry: Registry,

    // Session metrics
    sessions_opened: IntCounter,
    exceptions_reported: IntCounter,
    previewing: IntGauge,

    // Frame metrics
    frames_delivered: IntCounter,
    frames_converted: IntCounter,
    size_mismatches: IntCounter,
    stale_frames: IntGauge,

    // Buffer metrics
    buffer_width: IntGauge,
    buffer_height: IntGauge,
}

impl CaptureMetrics {
    /// Creates a new registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        // Session metrics
        let sessions_opened = IntCounter::new(
            "godot_camera_sessions_opened_total",
            "Total number of successful camera opens",
        )?;
        let exceptions_reported = IntCounter::new(
            "godot_camera_exceptions_total",
            "Total number of exception events reported to the receiver",
        )?;
        let previewing = IntGauge::new(
            "godot_camera_previewing",
            "Current preview state (1=streaming, 0=stopped)",
        )?;

        // Frame metrics
        let frames_delivered = IntCounter::new(
            "godot_camera_frames_delivered_total",
            "Total raw preview frames received from the device",
        )?;
        let frames_converted = IntCounter::new(
            "godot_camera_frames_converted_total",
            "Total frames converted to RGBA and dispatched",
        )?;
        let size_mismatches = IntCounter::new(
            "godot_camera_frame_size_mismatches_total",
            "Frames whose size differed from the allocated conversion buffers",
        )?;
        let stale_frames = IntGauge::new(
            "godot_camera_capture_stale_frames",
            "Frames converted with stale buffers since the running preview started",
        )?;

        // Buffer metrics
        let buffer_width = IntGauge::new(
            "godot_camera_buffer_width",
            "Width the conversion buffers are allocated for",
        )?;
        let buffer_height = IntGauge::new(
            "godot_camera_buffer_height",
            "Height the conversion buffers are allocated for",
        )?;

        registry.register(Box::new(sessions_opened.clone()))?;
        registry.register(Box::new(exceptions_reported.clone()))?;
        registry.register(Box::new(previewing.clone()))?;
        registry.register(Box::new(frames_delivered.clone()))?;
        registry.register(Box::new(frames_converted.clone()))?;
        registry.register(Box::new(size_mismatches.clone()))?;
        registry.register(Box::new(stale_frames.clone()))?;
        registry.register(Box::new(buffer_width.clone()))?;
        registry.register(Box::new(buffer_height.clone()))?;

        Ok(Self {
            registry,
            sessions_opened,
            exceptions_reported,
            previewing,
            frames_delivered,
            frames_converted,
            size_mismatches,
            stale_frames,
            buffer_width,
            buffer_height,
        })
    }

    pub fn record_open(&self) {
        self.sessions_opened.inc();
    }

    pub fn record_exception(&self) {
        self.exceptions_reported.inc();
    }

    /// Marks the preview as started with buffers of the given size.
    pub fn record_preview_started(&self, width: u32, height: u32) {
        self.previewing.set(1);
        self.stale_frames.set(0);
        self.buffer_width.set(i64::from(width));
        self.buffer_height.set(i64::from(height));
    }

    pub fn record_preview_stopped(&self) {
        self.previewing.set(0);
        self.stale_frames.set(0);
        self.buffer_width.set(0);
        self.buffer_height.set(0);
    }

    pub fn record_frame_delivered(&self) {
        self.frames_delivered.inc();
    }

    pub fn record_frame_converted(&self) {
        self.frames_converted.inc();
    }

    pub fn record_size_mismatch(&self) {
        self.size_mismatches.inc();
        self.stale_frames.inc();
    }

    /// Reads the current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_opened: self.sessions_opened.get(),
            exceptions_reported: self.exceptions_reported.get(),
            frames_delivered: self.frames_delivered.get(),
            frames_converted: self.frames_converted.get(),
            size_mismatches: self.size_mismatches.get(),
            previewing: self.previewing.get() == 1,
            buffer_width: self.buffer_width.get(),
            buffer_height: self.buffer_height.get(),
            stale_frames: self.stale_frames.get(),
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for CaptureMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CaptureMetrics")
            .field(&self.snapshot())
            .finish()
    }
}
