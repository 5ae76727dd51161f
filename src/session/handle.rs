//! Scoped ownership of an open device.

use crate::device::{CameraDevice, DeviceError, PreviewParameters};

/// An open device that is stopped and released when dropped.
pub(crate) struct OpenDevice {
    device: Box<dyn CameraDevice>,
    previewing: bool,
    released: bool,
}

impl OpenDevice {
    pub(crate) fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device,
            previewing: false,
            released: false,
        }
    }

    pub(crate) fn index(&self) -> i32 {
        self.device.index()
    }

    pub(crate) fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub(crate) fn set_previewing(&mut self, previewing: bool) {
        self.previewing = previewing;
    }

    pub(crate) fn device(&mut self) -> &mut dyn CameraDevice {
        self.device.as_mut()
    }

    pub(crate) fn parameters(&self) -> PreviewParameters {
        self.device.parameters()
    }

    /// Read-modify-write of the device parameter set.
    pub(crate) fn update_parameters(
        &mut self,
        change: impl FnOnce(&mut PreviewParameters),
    ) -> Result<(), DeviceError> {
        let mut params = self.device.parameters();
        change(&mut params);
        self.device.set_parameters(&params)
    }

    /// Stops streaming, drops the frame callback (and with it the
    /// conversion buffers) and releases the device.
    pub(crate) fn close(&mut self) {
        if self.released {
            return;
        }
        self.device.stop_preview();
        self.device.set_frame_callback(None);
        self.device.release();
        self.previewing = false;
        self.released = true;
    }
}

impl Drop for OpenDevice {
    fn drop(&mut self) {
        self.close();
    }
}
