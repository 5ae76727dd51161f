//! Property tests for the session sentinels and the conversion pipeline.

use godot_camera::{
    convert::{ConversionKernel, ConversionPipeline, FrameShape, SoftwareKernel, ThreadedKernel},
    device::{format, MockBackend},
    dispatch::ChannelSink,
    session::{CameraSession, SessionState},
    YuvLayout,
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Call {
    StartCapture,
    StopCapture,
    SetPreviewSize(u32, u32),
    SetPreviewFormat(i32),
}

fn call_strategy() -> impl Strategy<Value = Call> {
    prop_oneof![
        Just(Call::StartCapture),
        Just(Call::StopCapture),
        (0u32..2000, 0u32..2000).prop_map(|(w, h)| Call::SetPreviewSize(w, h)),
        prop_oneof![Just(format::NV21), Just(format::YV12), any::<i32>()]
            .prop_map(Call::SetPreviewFormat),
    ]
}

fn layout_strategy() -> impl Strategy<Value = YuvLayout> {
    prop_oneof![
        Just(YuvLayout::Nv21),
        Just(YuvLayout::Nv12),
        Just(YuvLayout::Yv12),
        Just(YuvLayout::I420),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn closed_session_stays_inert(calls in prop::collection::vec(call_strategy(), 0..20)) {
        let backend = MockBackend::new(1);
        let (sink, rx) = ChannelSink::new();
        let mut session = CameraSession::new(backend.clone(), Arc::new(sink));

        for call in calls {
            match call {
                Call::StartCapture => session.start_capture(),
                Call::StopCapture => session.stop_capture(),
                Call::SetPreviewSize(w, h) => session.set_preview_size(w, h),
                Call::SetPreviewFormat(code) => session.set_preview_format(code),
            }

            prop_assert_eq!(session.state(), SessionState::Closed);
            prop_assert_eq!(session.device_count(), -1);
            prop_assert_eq!(session.preview_size(), (0, 0));
            prop_assert_eq!(session.preview_frame_rate(), -1);
            prop_assert_eq!(session.preview_format(), -1);
            prop_assert_eq!(session.supported_preview_formats(), vec![0]);
        }

        prop_assert_eq!(backend.open_count(), 0);
        prop_assert_eq!(backend.parameters().width, 640);
        prop_assert!(rx.try_recv().is_err());
    }

    #[test]
    fn output_is_four_bytes_per_pixel(
        half_w in 1u32..48,
        half_h in 1u32..48,
        layout in layout_strategy(),
        seed in any::<u8>(),
    ) {
        let (width, height) = (half_w * 2, half_h * 2);
        let mut pipeline = ConversionPipeline::software();
        pipeline.allocate_with_layout(width, height, layout).unwrap();

        let len = (width * height * 3 / 2) as usize;
        let raw: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();
        let frame = pipeline.convert(&raw).unwrap();

        prop_assert_eq!(frame.pixels().len(), (width * height * 4) as usize);
        prop_assert!(frame.pixels().chunks_exact(4).all(|px| px[3] == 255));
        prop_assert_eq!(pipeline.mismatches(), 0);
    }

    #[test]
    fn mismatched_frames_keep_allocated_shape(
        half_w in 1u32..32,
        half_h in 1u32..32,
        len in 0usize..6000,
    ) {
        let (width, height) = (half_w * 2, half_h * 2);
        let mut pipeline = ConversionPipeline::software();
        pipeline.allocate(width, height).unwrap();

        let frame = pipeline.convert(&vec![200u8; len]).unwrap();
        prop_assert_eq!(frame.width(), width);
        prop_assert_eq!(frame.height(), height);
        prop_assert!(frame.is_valid());
    }

    #[test]
    fn threaded_kernel_matches_software(
        half_w in 1u32..40,
        half_h in 1u32..40,
        threads in 1usize..9,
        layout in layout_strategy(),
        raw_seed in any::<u64>(),
    ) {
        let shape = FrameShape::new(half_w * 2, half_h * 2, layout);
        let raw: Vec<u8> = (0..shape.input_len())
            .map(|i| ((i as u64).wrapping_mul(6364136223846793005).wrapping_add(raw_seed) >> 56) as u8)
            .collect();

        let mut expected = vec![0u8; shape.output_len()];
        SoftwareKernel.convert(&shape, &raw, &mut expected);
        let mut actual = vec![0u8; shape.output_len()];
        ThreadedKernel::new(threads).convert(&shape, &raw, &mut actual);

        prop_assert_eq!(expected, actual);
    }
}
