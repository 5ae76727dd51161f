//! Conversion kernels.
//!
//! All kernels compute the BT.601 limited-range transform with the same
//! 8-bit fixed-point coefficients the platform YUV intrinsic uses:
//!
//! ```text
//! C = Y - 16, D = U - 128, E = V - 128
//! R = (298C + 409E + 128) >> 8
//! G = (298C - 100D - 208E + 128) >> 8
//! B = (298C + 516D + 128) >> 8
//! ```
//!
//! Each channel is clamped to `0..=255`; alpha is always 255.

use super::FrameShape;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Converts one 4:2:0 frame into packed RGBA.
///
/// Implementations may assume `yuv.len() == shape.input_len()` and
/// `rgba.len() == shape.output_len()`; the pipeline guarantees both.
pub trait ConversionKernel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Converts `yuv` into `rgba` over the full extent of `shape`.
    fn convert(&self, shape: &FrameShape, yuv: &[u8], rgba: &mut [u8]);
}

#[inline]
fn clamp(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Converts a single pixel.
#[inline]
pub fn yuv_to_rgba(y: u8, u: u8, v: u8) -> [u8; 4] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;

    [clamp(r), clamp(g), clamp(b), 255]
}

/// Converts the rows covered by `rgba`, starting at `first_row`.
fn convert_rows(shape: &FrameShape, yuv: &[u8], rgba: &mut [u8], first_row: usize) {
    let width = shape.width as usize;
    let height = shape.height as usize;
    let row_bytes = width * 4;

    for (offset, out_row) in rgba.chunks_exact_mut(row_bytes).enumerate() {
        let row = first_row + offset;
        let luma = &yuv[row * width..(row + 1) * width];
        for (col, pixel) in out_row.chunks_exact_mut(4).enumerate() {
            let (u, v) = shape.layout.chroma(yuv, width, height, row, col);
            pixel.copy_from_slice(&yuv_to_rgba(luma[col], u, v));
        }
    }
}

/// Single-threaded reference kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareKernel;

impl ConversionKernel for SoftwareKernel {
    fn name(&self) -> &'static str {
        "software"
    }

    fn convert(&self, shape: &FrameShape, yuv: &[u8], rgba: &mut [u8]) {
        convert_rows(shape, yuv, rgba, 0);
    }
}

/// Splits the frame into horizontal bands converted on scoped threads.
///
/// Produces output identical to [`SoftwareKernel`].
#[derive(Debug, Clone, Copy)]
pub struct ThreadedKernel {
    threads: usize,
}

impl ThreadedKernel {
    /// Creates a kernel using `threads` workers; 0 means one per core.
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            threads
        };
        Self { threads }
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Default for ThreadedKernel {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ConversionKernel for ThreadedKernel {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn convert(&self, shape: &FrameShape, yuv: &[u8], rgba: &mut [u8]) {
        let height = shape.height as usize;
        let row_bytes = shape.width as usize * 4;
        let workers = self.threads.clamp(1, height.max(1));
        if workers == 1 || row_bytes == 0 {
            convert_rows(shape, yuv, rgba, 0);
            return;
        }

        let rows_per_band = height.div_ceil(workers);
        std::thread::scope(|scope| {
            for (band, out) in rgba.chunks_mut(rows_per_band * row_bytes).enumerate() {
                scope.spawn(move || convert_rows(shape, yuv, out, band * rows_per_band));
            }
        });
    }
}

/// Kernel selection, as it appears in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    #[default]
    Software,
    Threaded,
}

impl KernelKind {
    /// Instantiates the kernel. `threads` only applies to [`KernelKind::Threaded`].
    pub fn build(self, threads: usize) -> Arc<dyn ConversionKernel> {
        match self {
            KernelKind::Software => Arc::new(SoftwareKernel),
            KernelKind::Threaded => Arc::new(ThreadedKernel::new(threads)),
        }
    }
}

impl std::str::FromStr for KernelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "software" => Ok(KernelKind::Software),
            "threaded" => Ok(KernelKind::Threaded),
            other => Err(format!("unknown kernel: {}", other)),
        }
    }
}
