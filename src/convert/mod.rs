//! YUV 4:2:0 to RGBA frame conversion.
//!
//! Raw preview frames are copied into fixed-size buffers that are
//! allocated once when capture starts, converted by a pluggable kernel,
//! and copied out as packed RGBA frames. No per-frame allocation happens
//! inside the kernel itself.

mod frame;
mod kernel;
mod layout;
mod pipeline;

pub use frame::RgbaFrame;
pub use kernel::{yuv_to_rgba, ConversionKernel, KernelKind, SoftwareKernel, ThreadedKernel};
pub use layout::{FrameShape, YuvLayout};
pub use pipeline::{ConversionBuffers, ConversionPipeline, ConvertError};
