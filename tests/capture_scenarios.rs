//! End-to-end capture scenarios through the plugin surface.

use godot_camera::{
    device::{format, DeviceError, MockBackend},
    dispatch::{CameraEvent, ChannelSink, Dispatch, ON_CAPTURED_DATA, ON_EXCEPTION},
    metrics::CaptureMetrics,
    plugin::{GodotCamera, Variant},
    session::{CameraSession, SessionState},
    KernelKind,
};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

fn plugin_with(backend: &MockBackend, kernel: KernelKind) -> (GodotCamera, Receiver<Dispatch>) {
    let (sink, rx) = ChannelSink::new();
    let session = CameraSession::new(backend.clone(), Arc::new(sink))
        .with_kernel(kernel.build(3))
        .with_metrics(CaptureMetrics::new().unwrap());
    (GodotCamera::new(session), rx)
}

#[test]
fn test_open_failure_fires_one_exception() {
    let backend = MockBackend::new(1);
    backend.fail_next_open(DeviceError::Busy(0));
    let (mut camera, rx) = plugin_with(&backend, KernelKind::Software);
    camera.set_callback_object(77);

    assert_eq!(camera.initialize_camera(0), 0);
    assert_eq!(camera.session().state(), SessionState::Closed);

    let dispatch = rx.try_recv().unwrap();
    assert_eq!(dispatch.receiver, 77);
    assert_eq!(dispatch.event.method_name(), ON_EXCEPTION);
    assert_eq!(
        dispatch.event,
        CameraEvent::Exception {
            message: "camera 0 is in use by another client".into()
        }
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_vga_frame_round_trip() {
    let backend = MockBackend::new(1);
    let (mut camera, rx) = plugin_with(&backend, KernelKind::Software);

    assert_eq!(camera.initialize_camera(0), 1);
    camera.set_preview_size(640, 480);
    camera.initialize_capture();
    assert_eq!(camera.session().state(), SessionState::Previewing);

    let raw = vec![128u8; 640 * 480 * 3 / 2];
    assert_eq!(raw.len(), 460_800);
    assert!(backend.deliver(&raw));

    let dispatch = rx.try_recv().unwrap();
    assert_eq!(dispatch.event.method_name(), ON_CAPTURED_DATA);
    match dispatch.event {
        CameraEvent::CapturedData {
            rgba,
            width,
            height,
        } => {
            assert_eq!(rgba.len(), 1_228_800);
            assert_eq!(width, 640);
            assert_eq!(height, 480);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(rx.try_recv().is_err());

    camera.finalize_capture();
    camera.finalize_capture();
    assert_eq!(camera.session().state(), SessionState::Closed);
    assert!(!backend.is_device_open());
}

#[test]
fn test_supported_formats_before_open() {
    let backend = MockBackend::new(1);
    let (mut camera, rx) = plugin_with(&backend, KernelKind::Software);

    assert_eq!(camera.get_supported_preview_formats(), vec![0]);
    assert_eq!(
        camera.call("getSupportedPreviewFormats", &[]),
        Ok(Variant::IntArray(vec![0]))
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_yv12_capture_with_threaded_kernel() {
    let backend = MockBackend::new(2);
    let (mut camera, rx) = plugin_with(&backend, KernelKind::Threaded);

    assert_eq!(camera.initialize_camera(1), 1);
    camera.set_preview_size(320, 240);
    camera.set_preview_format(format::YV12);
    camera.initialize_capture();

    // Mid-grey luma with neutral chroma converts to grey in any layout.
    let mut raw = vec![126u8; 320 * 240];
    raw.resize(320 * 240 * 3 / 2, 128);
    assert!(backend.deliver(&raw));

    match rx.try_recv().unwrap().event {
        CameraEvent::CapturedData { rgba, .. } => {
            assert!(rgba.chunks_exact(4).all(|px| px == [128, 128, 128, 255]));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_resize_while_previewing_does_not_break_conversion() {
    let backend = MockBackend::new(1);
    let (mut camera, rx) = plugin_with(&backend, KernelKind::Software);

    camera.initialize_camera(0);
    camera.set_preview_size(640, 480);
    camera.initialize_capture();

    camera.set_preview_size(1280, 720);
    assert_eq!(camera.get_preview_size(), [1280, 720]);
    assert!(backend.deliver_synthetic(0));

    match rx.try_recv().unwrap().event {
        CameraEvent::CapturedData {
            rgba,
            width,
            height,
        } => {
            assert_eq!((width, height), (640, 480));
            assert_eq!(rgba.len(), 640 * 480 * 4);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_streaming_backend_delivers_until_finalized() {
    let backend = MockBackend::new(1).with_streaming(true);
    let (mut camera, rx) = plugin_with(&backend, KernelKind::Software);

    camera.initialize_camera(0);
    camera.set_preview_size(64, 48);
    camera.initialize_capture();

    let dispatch = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(
        dispatch.event,
        CameraEvent::CapturedData {
            width: 64,
            height: 48,
            ..
        }
    ));

    camera.finalize_capture();
    assert!(!backend.is_previewing());

    // Drain whatever was queued before the feed stopped; nothing follows.
    while rx.try_recv().is_ok() {}
    std::thread::sleep(Duration::from_millis(100));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_reopen_after_finalize() {
    let backend = MockBackend::new(1);
    let (mut camera, _rx) = plugin_with(&backend, KernelKind::Software);

    assert_eq!(camera.initialize_camera(0), 1);
    camera.initialize_capture();
    camera.finalize_capture();

    assert_eq!(camera.initialize_camera(0), 1);
    assert_eq!(camera.get_camera_count(), 1);
    assert_eq!(backend.open_count(), 2);
    assert_eq!(backend.release_count(), 1);
}
