//! Platform camera abstraction.
//!
//! This module models the pieces of the platform camera API the plugin
//! depends on: a backend that hands out devices by index, an open device
//! with a read-modify-write parameter set, and a per-frame callback that
//! the device invokes from its own delivery thread.

mod backend;
mod mock;
mod params;

pub use backend::{CameraBackend, CameraDevice, DeviceError, FrameCallback, PreviewTarget};
pub use mock::{synthetic_frame, MockBackend};
pub use params::{format, PreviewParameters};
