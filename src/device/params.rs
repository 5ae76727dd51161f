//! Preview parameter set and platform pixel format codes.

use serde::{Deserialize, Serialize};

/// Integer pixel format codes as defined by the Android `ImageFormat` class.
///
/// Not every device supports every format; query
/// [`PreviewParameters::supported_formats`] before setting one.
pub mod format {
    /// RGB 5:6:5, 16 bits per pixel.
    pub const RGB_565: i32 = 4;
    /// YCbCr 4:2:2 semi-planar.
    pub const NV16: i32 = 16;
    /// YCrCb 4:2:0 semi-planar, V before U. Default camera preview format.
    pub const NV21: i32 = 17;
    /// YCbCr 4:2:2 packed.
    pub const YUY2: i32 = 20;
    /// Flexible YCbCr 4:2:0.
    pub const YUV_420_888: i32 = 35;
    /// Compressed JPEG.
    pub const JPEG: i32 = 256;
    /// YCrCb 4:2:0 planar, V plane before U plane.
    pub const YV12: i32 = 0x3231_5659;

    /// Human-readable name for a format code.
    pub fn name(code: i32) -> &'static str {
        match code {
            RGB_565 => "RGB_565",
            NV16 => "NV16",
            NV21 => "NV21",
            YUY2 => "YUY2",
            YUV_420_888 => "YUV_420_888",
            JPEG => "JPEG",
            YV12 => "YV12",
            _ => "UNKNOWN",
        }
    }
}

/// Preview configuration of an open camera device.
///
/// Read from the device, modified, and written back as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewParameters {
    /// Preview width in pixels.
    pub width: u32,
    /// Preview height in pixels.
    pub height: u32,
    /// Preview pixel format code (see [`format`]).
    pub format: i32,
    /// Preview frame rate in frames per second.
    pub frame_rate: i32,
    /// Pixel format codes the device can stream.
    pub supported_formats: Vec<i32>,
}

impl Default for PreviewParameters {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            format: format::NV21,
            frame_rate: 30,
            supported_formats: vec![format::NV21, format::YV12],
        }
    }
}

impl PreviewParameters {
    /// Size in bytes of one 4:2:0 preview frame at the current resolution.
    pub fn frame_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 3 / 2
    }

    /// Returns true if `code` is one of the supported formats.
    pub fn supports_format(&self, code: i32) -> bool {
        self.supported_formats.contains(&code)
    }
}
