//! Deferred event delivery to the scripting-side receiver.
//!
//! The engine identifies script objects by an opaque integer id and
//! invokes named methods on them later, from its own main loop. Here that
//! transport is an injected [`EventSink`]; the session never owns it.

mod event;
mod sink;

pub use event::{CameraEvent, Dispatch, ReceiverId, ON_CAPTURED_DATA, ON_EXCEPTION};
pub use sink::{ChannelSink, EventSink, LogSink};
