//! Subscriber Output Sinks
//!
//! An [`EventSink`] is where the hub writes frames for one subscriber.
//! Writes never wait: a sink that cannot take a frame right now reports an
//! error and the hub detaches it.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::frame::Frame;

/// Default number of frames buffered per subscriber
pub const DEFAULT_SINK_BUFFER: usize = 256;

/// Output side of one subscriber connection
pub trait EventSink: Send + Sync {
    /// Write a frame without waiting
    fn send(&self, frame: Frame) -> Result<(), SinkError>;

    /// Close the sink. Closing an already closed sink succeeds.
    fn close(&self) -> Result<(), SinkError>;

    /// Whether further writes are known to fail
    fn is_closed(&self) -> bool;
}

/// Errors from writing to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Subscriber sink is closed")]
    Closed,

    #[error("Subscriber sink is full")]
    Full,
}

/// Sink backed by a bounded mpsc channel
///
/// The receiving half is drained by the transport (the SSE response body).
/// Dropping the receiver makes every later write fail with
/// [`SinkError::Closed`]; closing the sink drops the sender so the
/// receiver sees end-of-stream after the buffered frames.
pub struct ChannelSink {
    tx: Mutex<Option<mpsc::Sender<Frame>>>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new(buffer: usize) -> (Arc<Self>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let sink = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
        });
        (sink, rx)
    }
}

impl EventSink for ChannelSink {
    fn send(&self, frame: Frame) -> Result<(), SinkError> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = guard.as_ref().ok_or(SinkError::Closed)?;

        tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn close(&self) -> Result<(), SinkError> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}
