//! The session controller.

use super::handle::OpenDevice;
use super::SessionState;
use crate::convert::{ConversionKernel, ConversionPipeline, RgbaFrame, SoftwareKernel, YuvLayout};
use crate::device::{CameraBackend, FrameCallback, PreviewTarget};
use crate::dispatch::{CameraEvent, EventSink, ReceiverId};
use crate::metrics::CaptureMetrics;
use std::fmt::Display;
use std::sync::Arc;

/// Sends events to the current receiver and keeps metrics in step.
///
/// Cloned into the frame callback when capture starts, so frames go to
/// the receiver that was registered at that moment.
#[derive(Clone)]
struct Notifier {
    sink: Arc<dyn EventSink>,
    metrics: Option<CaptureMetrics>,
    receiver: ReceiverId,
}

impl Notifier {
    fn exception(&self, err: &dyn Display) {
        tracing::warn!(receiver = self.receiver, error = %err, "Reporting camera exception");
        if let Some(metrics) = &self.metrics {
            metrics.record_exception();
        }
        self.sink.notify(self.receiver, CameraEvent::exception(err));
    }

    fn captured(&self, frame: RgbaFrame) {
        tracing::trace!(
            sequence = frame.sequence(),
            width = frame.width(),
            height = frame.height(),
            "Dispatching converted frame"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_frame_converted();
        }
        self.sink.notify(self.receiver, CameraEvent::captured(frame));
    }
}

/// Controls the single camera session exposed to the scripting layer.
pub struct CameraSession {
    backend: Box<dyn CameraBackend>,
    kernel: Arc<dyn ConversionKernel>,
    notifier: Notifier,
    device: Option<OpenDevice>,
}

impl CameraSession {
    /// Creates a closed session using the software conversion kernel.
    pub fn new(backend: impl CameraBackend + 'static, sink: Arc<dyn EventSink>) -> Self {
        Self {
            backend: Box::new(backend),
            kernel: Arc::new(SoftwareKernel),
            notifier: Notifier {
                sink,
                metrics: None,
                receiver: 0,
            },
            device: None,
        }
    }

    /// Uses `kernel` for conversions in subsequent captures.
    pub fn with_kernel(mut self, kernel: Arc<dyn ConversionKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    /// Records session and frame activity into `metrics`.
    pub fn with_metrics(mut self, metrics: CaptureMetrics) -> Self {
        self.notifier.metrics = Some(metrics);
        self
    }

    /// Sets the receiver for subsequent events.
    pub fn set_receiver(&mut self, receiver: ReceiverId) {
        self.notifier.receiver = receiver;
    }

    pub fn receiver(&self) -> ReceiverId {
        self.notifier.receiver
    }

    pub fn metrics(&self) -> Option<&CaptureMetrics> {
        self.notifier.metrics.as_ref()
    }

    pub fn state(&self) -> SessionState {
        match &self.device {
            None => SessionState::Closed,
            Some(device) if device.is_previewing() => SessionState::Previewing,
            Some(_) => SessionState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Acquires the camera at `index`.
    ///
    /// Failure is reported to the receiver as an exception event and
    /// `false` is returned; any device already held is kept. The new
    /// device is acquired before a previously held one is released, so a
    /// single-client backend refuses the re-open and the old device stays.
    pub fn open(&mut self, index: i32) -> bool {
        match self.backend.open(index) {
            Ok(device) => {
                if let Some(mut previous) = self.device.replace(OpenDevice::new(device)) {
                    tracing::info!(index = previous.index(), "Releasing previously opened camera");
                    previous.close();
                    if let Some(metrics) = &self.notifier.metrics {
                        metrics.record_preview_stopped();
                    }
                }
                if let Some(metrics) = &self.notifier.metrics {
                    metrics.record_open();
                }
                tracing::info!(index, "Camera opened");
                true
            }
            Err(err) => {
                self.notifier.exception(&err);
                false
            }
        }
    }

    /// Starts streaming converted frames to the receiver.
    ///
    /// Binds an offscreen preview target, allocates conversion buffers for
    /// the preview size in effect now, installs the frame callback and
    /// starts the preview. Calling it again while previewing rebinds with
    /// freshly sized buffers.
    pub fn start_capture(&mut self) {
        let notifier = &self.notifier;
        let Some(open) = self.device.as_mut() else {
            return;
        };

        if let Err(err) = open.device().set_preview_target(PreviewTarget::offscreen()) {
            notifier.exception(&err);
        }

        let params = open.parameters();
        let layout = YuvLayout::from_format(params.format);
        let mut pipeline = ConversionPipeline::new(Arc::clone(&self.kernel));
        if let Err(err) = pipeline.allocate_with_layout(params.width, params.height, layout) {
            notifier.exception(&err);
            return;
        }

        let frame_notifier = notifier.clone();
        let callback: FrameCallback = Box::new(move |raw: &[u8]| {
            if let Some(metrics) = &frame_notifier.metrics {
                metrics.record_frame_delivered();
            }
            let mismatches = pipeline.mismatches();
            match pipeline.convert(raw) {
                Ok(frame) => {
                    if pipeline.mismatches() > mismatches {
                        if let Some(metrics) = &frame_notifier.metrics {
                            metrics.record_size_mismatch();
                        }
                    }
                    frame_notifier.captured(frame);
                }
                Err(err) => tracing::warn!(error = %err, "Dropped preview frame"),
            }
        });
        open.device().set_frame_callback(Some(callback));

        if let Err(err) = open.device().start_preview() {
            open.device().set_frame_callback(None);
            open.set_previewing(false);
            notifier.exception(&err);
            return;
        }

        open.set_previewing(true);
        if let Some(metrics) = &notifier.metrics {
            metrics.record_preview_started(params.width, params.height);
        }
        tracing::info!(
            index = open.index(),
            width = params.width,
            height = params.height,
            format = crate::device::format::name(params.format),
            kernel = self.kernel.name(),
            "Capture started"
        );
    }

    /// Stops streaming and releases the device. Safe to call repeatedly.
    pub fn stop_capture(&mut self) {
        let Some(mut open) = self.device.take() else {
            return;
        };
        open.close();
        if let Some(metrics) = &self.notifier.metrics {
            metrics.record_preview_stopped();
        }
        tracing::info!(index = open.index(), "Capture finalized, camera released");
    }

    /// Number of cameras on the system, or -1 when no camera is open.
    pub fn device_count(&self) -> i32 {
        match self.device {
            Some(_) => i32::try_from(self.backend.device_count()).unwrap_or(i32::MAX),
            None => -1,
        }
    }

    /// Sets the preview resolution.
    ///
    /// Buffers of a running capture keep their size until the next
    /// [`start_capture`](Self::start_capture).
    pub fn set_preview_size(&mut self, width: u32, height: u32) {
        let Some(open) = self.device.as_mut() else {
            return;
        };
        if let Err(err) = open.update_parameters(|p| {
            p.width = width;
            p.height = height;
        }) {
            tracing::warn!(width, height, error = %err, "Preview size rejected");
        } else if open.is_previewing() {
            tracing::debug!(width, height, "Preview resized during capture");
        }
    }

    /// Sets the preview pixel format code.
    pub fn set_preview_format(&mut self, format: i32) {
        let Some(open) = self.device.as_mut() else {
            return;
        };
        if let Err(err) = open.update_parameters(|p| p.format = format) {
            tracing::warn!(format, error = %err, "Preview format rejected");
        }
    }

    /// Current preview size, or `(0, 0)` when closed.
    pub fn preview_size(&self) -> (u32, u32) {
        self.device
            .as_ref()
            .map(|open| {
                let params = open.parameters();
                (params.width, params.height)
            })
            .unwrap_or((0, 0))
    }

    /// Current preview frame rate, or -1 when closed.
    pub fn preview_frame_rate(&self) -> i32 {
        self.device
            .as_ref()
            .map(|open| open.parameters().frame_rate)
            .unwrap_or(-1)
    }

    /// Current preview format code, or -1 when closed.
    pub fn preview_format(&self) -> i32 {
        self.device
            .as_ref()
            .map(|open| open.parameters().format)
            .unwrap_or(-1)
    }

    /// Supported preview format codes, or `[0]` when closed.
    pub fn supported_preview_formats(&self) -> Vec<i32> {
        self.device
            .as_ref()
            .map(|open| open.parameters().supported_formats)
            .unwrap_or_else(|| vec![0])
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("state", &self.state())
            .field("receiver", &self.notifier.receiver)
            .field("kernel", &self.kernel.name())
            .finish()
    }
}
