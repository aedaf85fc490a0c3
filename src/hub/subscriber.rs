//! Subscriber handle: an identity plus the sink it writes to.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::frame::Frame;
use super::sink::{EventSink, SinkError};

/// Unique identifier for an attached subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One attached output connection
///
/// Cloning yields another handle to the same subscriber; identity is the
/// [`SubscriberId`], never the sink contents.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    sink: Arc<dyn EventSink>,
}

impl Subscriber {
    /// Wrap a sink with a fresh identity
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            id: SubscriberId::new(),
            sink,
        }
    }

    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    pub(crate) fn send(&self, frame: Frame) -> Result<(), SinkError> {
        self.sink.send(frame)
    }

    pub(crate) fn close(&self) -> Result<(), SinkError> {
        self.sink.close()
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("closed", &self.sink.is_closed())
            .finish()
    }
}
