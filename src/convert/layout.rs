//! Chroma layouts and the buffer shape a kernel is bound to.

use crate::device::format;
use serde::{Deserialize, Serialize};

/// Arrangement of the two quarter-resolution chroma planes that follow
/// the full-resolution luma plane.
///
/// Rows are packed with no padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YuvLayout {
    /// Interleaved V/U pairs. Camera preview default.
    #[default]
    Nv21,
    /// Interleaved U/V pairs.
    Nv12,
    /// Separate V plane followed by U plane.
    Yv12,
    /// Separate U plane followed by V plane.
    I420,
}

impl YuvLayout {
    /// Picks the layout for a preview format code.
    ///
    /// Codes that are not a known 4:2:0 layout are read as NV21, which is
    /// what the platform's YUV intrinsic assumes for camera data.
    pub fn from_format(code: i32) -> Self {
        match code {
            format::YV12 => YuvLayout::Yv12,
            _ => YuvLayout::Nv21,
        }
    }

    /// Returns `(u, v)` for the pixel at `(row, col)`.
    #[inline]
    pub(crate) fn chroma(
        self,
        yuv: &[u8],
        width: usize,
        height: usize,
        row: usize,
        col: usize,
    ) -> (u8, u8) {
        let luma_len = width * height;
        match self {
            YuvLayout::Nv21 | YuvLayout::Nv12 => {
                let idx = luma_len + (row / 2) * width + (col / 2) * 2;
                if self == YuvLayout::Nv21 {
                    (yuv[idx + 1], yuv[idx])
                } else {
                    (yuv[idx], yuv[idx + 1])
                }
            }
            YuvLayout::Yv12 | YuvLayout::I420 => {
                let plane_len = (width / 2) * (height / 2);
                let idx = (row / 2) * (width / 2) + col / 2;
                let first = yuv[luma_len + idx];
                let second = yuv[luma_len + plane_len + idx];
                if self == YuvLayout::Yv12 {
                    (second, first)
                } else {
                    (first, second)
                }
            }
        }
    }
}

/// Dimensions and layout a set of conversion buffers was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
    pub width: u32,
    pub height: u32,
    pub layout: YuvLayout,
}

impl FrameShape {
    pub fn new(width: u32, height: u32, layout: YuvLayout) -> Self {
        Self {
            width,
            height,
            layout,
        }
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Raw 4:2:0 frame size, 12 bits per pixel.
    #[inline]
    pub fn input_len(&self) -> usize {
        self.pixel_count() * 3 / 2
    }

    /// Packed RGBA frame size, 4 bytes per pixel.
    #[inline]
    pub fn output_len(&self) -> usize {
        self.pixel_count() * 4
    }

    /// Returns true if both buffer sizes for this shape are addressable.
    ///
    /// Shapes that fail this check must not be passed to the size
    /// accessors, which assume it holds.
    pub fn fits_in_memory(&self) -> bool {
        usize::try_from(self.width)
            .ok()
            .zip(usize::try_from(self.height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .and_then(|pixels| pixels.checked_mul(4))
            .is_some_and(|bytes| bytes <= isize::MAX as usize)
    }
}
