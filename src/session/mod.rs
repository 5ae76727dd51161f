//! Camera session control.
//!
//! A [`CameraSession`] owns at most one open device and drives it through
//! `Closed → Open → Previewing → Closed`. Platform failures during open
//! and capture start are turned into exception events for the receiver
//! instead of errors for the caller; calls made while no device is open
//! are silently ignored and queries return fixed sentinel values.

mod controller;
mod handle;
mod state;

pub use controller::CameraSession;
pub use state::SessionState;
