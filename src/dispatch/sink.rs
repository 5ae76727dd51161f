//! Event sinks.

use super::{CameraEvent, Dispatch, ReceiverId};
use std::sync::mpsc::{self, Receiver, Sender};

/// Accepts events for deferred delivery to a receiver.
///
/// Called from both the control thread (exceptions) and the frame
/// delivery thread (captured data), so implementations must be thread
/// safe and must not block for long.
pub trait EventSink: Send + Sync {
    fn notify(&self, receiver: ReceiverId, event: CameraEvent);
}

/// Queues events on a channel for the engine's main loop to drain.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Dispatch>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end of its queue.
    pub fn new() -> (Self, Receiver<Dispatch>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn notify(&self, receiver: ReceiverId, event: CameraEvent) {
        let method = event.method_name();
        if self.tx.send(Dispatch { receiver, event }).is_err() {
            tracing::debug!(receiver, method, "Event dropped, dispatch queue closed");
        }
    }
}

/// Logs events and discards them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, receiver: ReceiverId, event: CameraEvent) {
        match event {
            CameraEvent::CapturedData { width, height, .. } => {
                tracing::trace!(receiver, width, height, "Captured frame");
            }
            CameraEvent::Exception { message } => {
                tracing::warn!(receiver, %message, "Camera exception");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, rx) = ChannelSink::new();
        sink.notify(7, CameraEvent::exception("first"));
        sink.notify(
            7,
            CameraEvent::CapturedData {
                rgba: vec![0; 4],
                width: 1,
                height: 1,
            },
        );

        let first = rx.try_recv().unwrap();
        assert_eq!(first.receiver, 7);
        assert_eq!(first.event, CameraEvent::exception("first"));
        assert_eq!(rx.try_recv().unwrap().event.method_name(), "_on_captured_data");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_closed_queue() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.notify(0, CameraEvent::exception("nobody listening"));
    }
}
