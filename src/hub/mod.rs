//! Real-Time Event Hub
//!
//! In-memory fan-out core: a bounded history of recent messages, the set
//! of attached subscribers, and the per-connection lifecycle that ties
//! them to a transport.
//!
//! ## Architecture
//!
//! - **HistoryLog**: bounded, oldest-first log replayed to new subscribers
//! - **SubscriberRegistry**: identity-keyed set of attached subscribers
//! - **EventHub**: publish → append → broadcast, attach, detach, liveness
//! - **Connection**: `Connecting → Active → Closed` state machine owning
//!   the keep-alive task
//!
//! ```text
//! Publish:  MessageDraft → EventHub::publish → HistoryLog::append
//!                                            → every Subscriber ← Frame::Message
//! Attach:   Connection::open → EventHub::attach_and_prime_history
//!                                → Frame::History, then register
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use chat_hub::hub::{ChannelSink, Connection, EventHub, HubConfig, MessageDraft};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = Arc::new(EventHub::new(HubConfig::default()));
//!
//!     let (sink, mut frames) = ChannelSink::new(hub.config().sink_buffer);
//!     let connection = Connection::open(Arc::clone(&hub), sink);
//!
//!     let draft = MessageDraft::new(Some("alice"), "hi", &hub.config().limits).unwrap();
//!     hub.publish(draft);
//!
//!     while let Some(frame) = frames.recv().await {
//!         println!("{:?}", frame);
//!     }
//!     drop(connection);
//! }
//! ```

mod connection;
mod event_hub;
mod frame;
mod history;
mod message;
mod registry;
mod sink;
mod subscriber;

pub use connection::{CloseReason, Connection, ConnectionGuard, ConnectionState};
pub use event_hub::{EventHub, HubConfig};
pub use frame::Frame;
pub use history::{HistoryLog, DEFAULT_HISTORY_CAPACITY};
pub use message::{ChatMessage, DraftError, MessageDraft, MessageLimits, DEFAULT_USER};
pub use registry::SubscriberRegistry;
pub use sink::{ChannelSink, EventSink, SinkError, DEFAULT_SINK_BUFFER};
pub use subscriber::{Subscriber, SubscriberId};
