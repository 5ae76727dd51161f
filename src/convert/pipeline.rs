//! Buffer lifecycle around a conversion kernel.

use super::{ConversionKernel, FrameShape, RgbaFrame, SoftwareKernel, YuvLayout};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during frame conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("invalid conversion size {width}x{height} (must be non-zero, even and addressable)")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("conversion buffers not allocated")]
    NotAllocated,
}

/// Input and output buffers bound to one frame shape.
///
/// Capacities are only meaningful for the shape they were created with.
pub struct ConversionBuffers {
    shape: FrameShape,
    input: Vec<u8>,
    output: Vec<u8>,
    kernel: Arc<dyn ConversionKernel>,
}

impl ConversionBuffers {
    fn new(shape: FrameShape, kernel: Arc<dyn ConversionKernel>) -> Self {
        Self {
            input: vec![0u8; shape.input_len()],
            output: vec![0u8; shape.output_len()],
            shape,
            kernel,
        }
    }

    /// Shape the buffers and kernel are bound to.
    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Raw input capacity in bytes (`w*h*3/2`).
    pub fn input_capacity(&self) -> usize {
        self.input.len()
    }

    /// RGBA output capacity in bytes (`w*h*4`).
    pub fn output_capacity(&self) -> usize {
        self.output.len()
    }
}

impl std::fmt::Debug for ConversionBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionBuffers")
            .field("shape", &self.shape)
            .field("input", &self.input.len())
            .field("output", &self.output.len())
            .field("kernel", &self.kernel.name())
            .finish()
    }
}

/// Converts raw 4:2:0 frames to RGBA through reusable buffers.
///
/// Buffers are allocated once per capture and reused for every frame.
/// A frame whose length differs from the allocated input is still
/// converted at the allocated shape: the overlapping prefix is copied and
/// the rest of the input keeps whatever the previous frame left there.
pub struct ConversionPipeline {
    kernel: Arc<dyn ConversionKernel>,
    buffers: Option<ConversionBuffers>,
    sequence: u64,
    mismatches: u64,
}

impl ConversionPipeline {
    pub fn new(kernel: Arc<dyn ConversionKernel>) -> Self {
        Self {
            kernel,
            buffers: None,
            sequence: 0,
            mismatches: 0,
        }
    }

    /// Creates a pipeline backed by [`SoftwareKernel`].
    pub fn software() -> Self {
        Self::new(Arc::new(SoftwareKernel))
    }

    /// Allocates NV21 buffers for `width` x `height`.
    pub fn allocate(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<&ConversionBuffers, ConvertError> {
        self.allocate_with_layout(width, height, YuvLayout::Nv21)
    }

    /// Allocates buffers for `width` x `height` frames in `layout`,
    /// replacing any previous allocation.
    pub fn allocate_with_layout(
        &mut self,
        width: u32,
        height: u32,
        layout: YuvLayout,
    ) -> Result<&ConversionBuffers, ConvertError> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(ConvertError::InvalidDimensions { width, height });
        }

        let shape = FrameShape::new(width, height, layout);
        if !shape.fits_in_memory() {
            return Err(ConvertError::InvalidDimensions { width, height });
        }
        tracing::debug!(
            width,
            height,
            layout = ?layout,
            kernel = self.kernel.name(),
            input_bytes = shape.input_len(),
            output_bytes = shape.output_len(),
            "Allocated conversion buffers"
        );

        self.sequence = 0;
        self.mismatches = 0;
        let buffers = self
            .buffers
            .insert(ConversionBuffers::new(shape, Arc::clone(&self.kernel)));
        Ok(&*buffers)
    }

    /// Drops the buffers.
    pub fn release(&mut self) {
        if self.buffers.take().is_some() {
            tracing::debug!("Released conversion buffers");
        }
    }

    /// Current buffers, if allocated.
    pub fn buffers(&self) -> Option<&ConversionBuffers> {
        self.buffers.as_ref()
    }

    /// Frames converted whose length did not match the input buffer.
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }

    /// Converts one raw frame.
    ///
    /// The returned frame always has the allocated dimensions.
    pub fn convert(&mut self, raw: &[u8]) -> Result<RgbaFrame, ConvertError> {
        let buffers = self.buffers.as_mut().ok_or(ConvertError::NotAllocated)?;

        let copied = raw.len().min(buffers.input.len());
        buffers.input[..copied].copy_from_slice(&raw[..copied]);

        if raw.len() != buffers.input.len() {
            self.mismatches += 1;
            if self.mismatches == 1 {
                tracing::warn!(
                    expected = buffers.input.len(),
                    received = raw.len(),
                    width = buffers.shape.width,
                    height = buffers.shape.height,
                    "Raw frame size does not match conversion buffers"
                );
            } else {
                tracing::trace!(received = raw.len(), "Frame size mismatch");
            }
        }

        buffers
            .kernel
            .convert(&buffers.shape, &buffers.input, &mut buffers.output);

        self.sequence += 1;
        Ok(RgbaFrame::new(
            buffers.output.clone(),
            buffers.shape.width,
            buffers.shape.height,
            self.sequence,
        ))
    }
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("kernel", &self.kernel.name())
            .field("buffers", &self.buffers)
            .field("sequence", &self.sequence)
            .finish()
    }
}
