//! In-process camera backend for tests and the demo CLI.
//!
//! Behaves like a single-client platform camera by default: one device
//! open at a time, parameters validated on write, frames delivered only while a
//! preview target is bound and the preview is running. Failures can be
//! injected one-shot to exercise the plugin's error reporting.

use super::{
    CameraBackend, CameraDevice, DeviceError, FrameCallback, PreviewParameters, PreviewTarget,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

type CallbackSlot = Arc<Mutex<Option<FrameCallback>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct MockState {
    device_count: usize,
    streaming: bool,
    max_clients: usize,
    open_devices: usize,
    next_open_failure: Option<DeviceError>,
    next_bind_failure: Option<DeviceError>,
    next_start_failure: Option<DeviceError>,
    params: PreviewParameters,
    preview_target: Option<PreviewTarget>,
    previewing: bool,
    open_count: u64,
    release_count: u64,
}

/// Mock camera backend.
///
/// Cloning yields another handle to the same simulated hardware, so a
/// test can keep one clone for inspection and frame injection while the
/// session owns another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    callback: CallbackSlot,
}

impl MockBackend {
    /// Creates a backend exposing `device_count` cameras.
    pub fn new(device_count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                device_count,
                streaming: false,
                max_clients: 1,
                open_devices: 0,
                next_open_failure: None,
                next_bind_failure: None,
                next_start_failure: None,
                params: PreviewParameters::default(),
                preview_target: None,
                previewing: false,
                open_count: 0,
                release_count: 0,
            })),
            callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets the parameters every newly opened device starts with.
    pub fn with_parameters(self, params: PreviewParameters) -> Self {
        lock(&self.state).params = params;
        self
    }

    /// When enabled, a started preview spawns a thread that streams
    /// synthetic frames at the configured frame rate.
    pub fn with_streaming(self, enabled: bool) -> Self {
        lock(&self.state).streaming = enabled;
        self
    }

    /// Allows up to `clients` devices to be held open at once.
    ///
    /// All open devices share the simulated sensor, its parameters and
    /// its single frame callback slot.
    pub fn with_max_clients(self, clients: usize) -> Self {
        lock(&self.state).max_clients = clients.max(1);
        self
    }

    /// Makes the next `open` fail with `err`.
    pub fn fail_next_open(&self, err: DeviceError) {
        lock(&self.state).next_open_failure = Some(err);
    }

    /// Makes the next preview target bind fail with `err`.
    pub fn fail_next_preview_bind(&self, err: DeviceError) {
        lock(&self.state).next_bind_failure = Some(err);
    }

    /// Makes the next `start_preview` fail with `err`.
    pub fn fail_next_start(&self, err: DeviceError) {
        lock(&self.state).next_start_failure = Some(err);
    }

    /// Returns true while any device is held open.
    pub fn is_device_open(&self) -> bool {
        lock(&self.state).open_devices > 0
    }

    /// Number of devices currently held open.
    pub fn open_devices(&self) -> usize {
        lock(&self.state).open_devices
    }

    /// Returns true while the preview is running.
    pub fn is_previewing(&self) -> bool {
        lock(&self.state).previewing
    }

    /// Parameters as currently stored on the simulated hardware.
    pub fn parameters(&self) -> PreviewParameters {
        lock(&self.state).params.clone()
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> u64 {
        lock(&self.state).open_count
    }

    /// Number of releases so far.
    pub fn release_count(&self) -> u64 {
        lock(&self.state).release_count
    }

    /// Delivers one raw frame to the installed callback.
    ///
    /// Returns false (and drops the frame) unless the preview is running
    /// with a bound target and a callback installed.
    pub fn deliver(&self, raw: &[u8]) -> bool {
        {
            let state = lock(&self.state);
            if !state.previewing || state.preview_target.is_none() {
                return false;
            }
        }
        deliver_to(&self.callback, raw)
    }

    /// Delivers a synthetic frame sized for the current parameters.
    pub fn deliver_synthetic(&self, sequence: u64) -> bool {
        let frame = synthetic_frame(&self.parameters(), sequence);
        self.deliver(&frame)
    }
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("MockBackend")
            .field("device_count", &state.device_count)
            .field("open_devices", &state.open_devices)
            .field("previewing", &state.previewing)
            .finish()
    }
}

impl CameraBackend for MockBackend {
    fn device_count(&self) -> usize {
        lock(&self.state).device_count
    }

    fn open(&mut self, index: i32) -> Result<Box<dyn CameraDevice>, DeviceError> {
        let mut state = lock(&self.state);
        if let Some(err) = state.next_open_failure.take() {
            return Err(err);
        }
        if index < 0 || index as usize >= state.device_count {
            return Err(DeviceError::InvalidIndex {
                index,
                count: state.device_count,
            });
        }
        if state.open_devices >= state.max_clients {
            return Err(DeviceError::Busy(index));
        }

        state.open_devices += 1;
        state.open_count += 1;
        state.preview_target = None;
        state.previewing = false;
        tracing::info!(index, "MockBackend opened camera");

        Ok(Box::new(MockDevice {
            index,
            state: Arc::clone(&self.state),
            callback: Arc::clone(&self.callback),
            feed: None,
            released: false,
        }))
    }
}

struct Feed {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct MockDevice {
    index: i32,
    state: Arc<Mutex<MockState>>,
    callback: CallbackSlot,
    feed: Option<Feed>,
    released: bool,
}

impl MockDevice {
    fn ensure_live(&self) -> Result<(), DeviceError> {
        if self.released {
            Err(DeviceError::Released)
        } else {
            Ok(())
        }
    }

    fn spawn_feed(&mut self) -> Result<(), DeviceError> {
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::clone(&self.state);
        let callback = Arc::clone(&self.callback);
        let flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("camera-preview".into())
            .spawn(move || {
                let mut sequence = 0u64;
                while !flag.load(Ordering::Acquire) {
                    let (frame, interval) = {
                        let state = lock(&state);
                        let rate = state.params.frame_rate.max(1) as u64;
                        (
                            synthetic_frame(&state.params, sequence),
                            Duration::from_millis(1000 / rate),
                        )
                    };
                    deliver_to(&callback, &frame);
                    sequence += 1;
                    std::thread::sleep(interval);
                }
            })
            .map_err(|e| DeviceError::StartFailed(e.to_string()))?;

        self.feed = Some(Feed { stop, handle });
        Ok(())
    }
}

impl CameraDevice for MockDevice {
    fn index(&self) -> i32 {
        self.index
    }

    fn parameters(&self) -> PreviewParameters {
        lock(&self.state).params.clone()
    }

    fn set_parameters(&mut self, params: &PreviewParameters) -> Result<(), DeviceError> {
        self.ensure_live()?;
        if params.width == 0 || params.height == 0 {
            return Err(DeviceError::UnsupportedParameter(format!(
                "preview size {}x{}",
                params.width, params.height
            )));
        }
        if !params.supports_format(params.format) {
            return Err(DeviceError::UnsupportedParameter(format!(
                "preview format {}",
                params.format
            )));
        }
        if params.frame_rate <= 0 {
            return Err(DeviceError::UnsupportedParameter(format!(
                "preview frame rate {}",
                params.frame_rate
            )));
        }
        lock(&self.state).params = params.clone();
        Ok(())
    }

    fn set_preview_target(&mut self, target: PreviewTarget) -> Result<(), DeviceError> {
        self.ensure_live()?;
        let mut state = lock(&self.state);
        if let Some(err) = state.next_bind_failure.take() {
            return Err(err);
        }
        state.preview_target = Some(target);
        Ok(())
    }

    fn set_frame_callback(&mut self, callback: Option<FrameCallback>) {
        if self.released {
            return;
        }
        *lock(&self.callback) = callback;
    }

    fn start_preview(&mut self) -> Result<(), DeviceError> {
        self.ensure_live()?;
        let streaming = {
            let mut state = lock(&self.state);
            if let Some(err) = state.next_start_failure.take() {
                return Err(err);
            }
            if state.previewing {
                return Ok(());
            }
            state.previewing = true;
            state.streaming && state.preview_target.is_some()
        };
        if streaming {
            self.spawn_feed()?;
        }
        Ok(())
    }

    fn stop_preview(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.stop.store(true, Ordering::Release);
            if feed.handle.join().is_err() {
                tracing::warn!(index = self.index, "Preview feed thread panicked");
            }
        }
        lock(&self.state).previewing = false;
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.stop_preview();
        *lock(&self.callback) = None;

        let mut state = lock(&self.state);
        state.open_devices = state.open_devices.saturating_sub(1);
        state.preview_target = None;
        state.release_count += 1;
        self.released = true;
        tracing::info!(index = self.index, "MockBackend released camera");
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.release();
    }
}

fn deliver_to(slot: &CallbackSlot, raw: &[u8]) -> bool {
    match lock(slot).as_mut() {
        Some(callback) => {
            callback(raw);
            true
        }
        None => false,
    }
}

/// Builds a 4:2:0 frame for `params` with a moving luma ramp.
///
/// Luma stays inside the video range (16..=235) and chroma varies
/// slowly around neutral, so converted output is never flat.
pub fn synthetic_frame(params: &PreviewParameters, sequence: u64) -> Vec<u8> {
    let width = params.width as usize;
    let height = params.height as usize;
    let luma_len = width * height;
    let mut frame = Vec::with_capacity(params.frame_len());

    for row in 0..height {
        for col in 0..width {
            let ramp = (row as u64 + col as u64 + sequence) % 220;
            frame.push(16 + ramp as u8);
        }
    }
    for i in 0..(params.frame_len() - luma_len) {
        frame.push((96 + (i as u64 + sequence) % 64) as u8);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_open_and_release_lifecycle() {
        let mut backend = MockBackend::new(2);
        assert!(!backend.is_device_open());

        let mut device = backend.open(1).unwrap();
        assert_eq!(device.index(), 1);
        assert!(backend.is_device_open());
        assert_eq!(backend.open_count(), 1);

        device.release();
        device.release();
        assert!(!backend.is_device_open());
        assert_eq!(backend.release_count(), 1);
    }

    #[test]
    fn test_open_invalid_index() {
        let mut backend = MockBackend::new(1);
        assert!(matches!(
            backend.open(1),
            Err(DeviceError::InvalidIndex { index: 1, count: 1 })
        ));
        assert!(matches!(
            backend.open(-1),
            Err(DeviceError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_open_while_busy() {
        let mut backend = MockBackend::new(2);
        let _device = backend.open(0).unwrap();
        assert!(matches!(backend.open(1), Err(DeviceError::Busy(1))));
    }

    #[test]
    fn test_multi_client_backend() {
        let mut backend = MockBackend::new(2).with_max_clients(2);
        let mut first = backend.open(0).unwrap();
        let _second = backend.open(1).unwrap();
        assert_eq!(backend.open_devices(), 2);
        assert!(matches!(backend.open(0), Err(DeviceError::Busy(0))));

        first.release();
        assert_eq!(backend.open_devices(), 1);
        assert!(backend.is_device_open());
    }

    #[test]
    fn test_drop_releases_device() {
        let mut backend = MockBackend::new(1);
        let device = backend.open(0).unwrap();
        drop(device);
        assert!(!backend.is_device_open());
        assert!(backend.open(0).is_ok());
    }

    #[test]
    fn test_injected_open_failure_is_one_shot() {
        let mut backend = MockBackend::new(1);
        backend.fail_next_open(DeviceError::PermissionDenied("CAMERA".into()));
        assert!(matches!(
            backend.open(0),
            Err(DeviceError::PermissionDenied(_))
        ));
        assert!(backend.open(0).is_ok());
    }

    #[test]
    fn test_set_parameters_rejects_unsupported_format() {
        let mut backend = MockBackend::new(1);
        let mut device = backend.open(0).unwrap();

        let mut params = device.parameters();
        params.format = crate::device::format::JPEG;
        assert!(matches!(
            device.set_parameters(&params),
            Err(DeviceError::UnsupportedParameter(_))
        ));
        assert_eq!(device.parameters().format, crate::device::format::NV21);
    }

    #[test]
    fn test_deliver_requires_running_preview() {
        let mut backend = MockBackend::new(1);
        let mut device = backend.open(0).unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        device.set_frame_callback(Some(Box::new(move |raw: &[u8]| {
            counter.fetch_add(raw.len(), Ordering::SeqCst);
        })));

        assert!(!backend.deliver(&[1, 2, 3]));

        device.set_preview_target(PreviewTarget::offscreen()).unwrap();
        device.start_preview().unwrap();
        assert!(backend.deliver(&[1, 2, 3]));
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        device.stop_preview();
        assert!(!backend.deliver(&[1, 2, 3]));
    }

    #[test]
    fn test_streaming_feed_delivers_frames() {
        let mut backend = MockBackend::new(1).with_streaming(true);
        let mut device = backend.open(0).unwrap();

        let frames = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&frames);
        device.set_frame_callback(Some(Box::new(move |_raw: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        device.set_preview_target(PreviewTarget::offscreen()).unwrap();
        device.start_preview().unwrap();

        std::thread::sleep(Duration::from_millis(150));
        device.release();
        assert!(frames.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_synthetic_frame_size() {
        let params = PreviewParameters {
            width: 64,
            height: 48,
            ..Default::default()
        };
        let frame = synthetic_frame(&params, 7);
        assert_eq!(frame.len(), 64 * 48 * 3 / 2);
        assert!(frame[..64 * 48].iter().all(|&y| (16..=235).contains(&y)));
    }
}
