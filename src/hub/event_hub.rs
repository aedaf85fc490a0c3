//! Event Hub
//!
//! Owns the history log and the subscriber registry and runs the
//! publish/broadcast algorithm over them.
//!
//! Both structures live behind a single mutex so that priming a new
//! subscriber with history and registering it is atomic with respect to
//! publishes. The lock is never held across an await point and every sink
//! write is non-blocking, so a stalled subscriber cannot hold up anyone
//! else.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::frame::Frame;
use super::history::{HistoryLog, DEFAULT_HISTORY_CAPACITY};
use super::message::{ChatMessage, MessageDraft, MessageLimits};
use super::registry::SubscriberRegistry;
use super::sink::{SinkError, DEFAULT_SINK_BUFFER};
use super::subscriber::Subscriber;

/// Configuration for the event hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Number of messages replayed to new subscribers
    pub history_capacity: usize,
    /// Interval between liveness markers on each connection
    pub keepalive_interval: Duration,
    /// Frames buffered per subscriber before it counts as stalled
    pub sink_buffer: usize,
    /// Bounds applied to publisher input
    pub limits: MessageLimits,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            keepalive_interval: Duration::from_secs(30),
            sink_buffer: DEFAULT_SINK_BUFFER,
            limits: MessageLimits::default(),
        }
    }
}

struct HubState {
    history: HistoryLog,
    registry: SubscriberRegistry,
    /// Keeps `created_at` non-decreasing across publishes
    last_created_at: i64,
}

/// Fan-out hub shared by every connection
pub struct EventHub {
    state: Mutex<HubState>,
    shut_down: AtomicBool,
    config: HubConfig,
}

impl EventHub {
    /// Create a new hub with empty history and no subscribers
    pub fn new(config: HubConfig) -> Self {
        Self {
            state: Mutex::new(HubState {
                history: HistoryLog::new(config.history_capacity),
                registry: SubscriberRegistry::new(),
                last_created_at: 0,
            }),
            shut_down: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a message to history and every attached subscriber
    ///
    /// Stamps the message id and creation time, appends it to history and
    /// enqueues a `message` frame for each subscriber. Subscribers whose
    /// write fails are detached; the publish itself always succeeds.
    pub fn publish(&self, draft: MessageDraft) -> ChatMessage {
        let (message, delivered, failed) = {
            let mut state = self.lock_state();

            let created_at = Utc::now().timestamp_millis().max(state.last_created_at);
            state.last_created_at = created_at;

            let message = ChatMessage::from_draft(draft, created_at);
            state.history.append(message.clone());

            let mut delivered = 0;
            let mut failed = Vec::new();
            state.registry.for_each(|subscriber| {
                match subscriber.send(Frame::Message(message.clone())) {
                    Ok(()) => delivered += 1,
                    Err(e) => failed.push((subscriber.clone(), e)),
                }
            });

            for (subscriber, _) in &failed {
                state.registry.unregister(subscriber.id());
            }

            (message, delivered, failed)
        };

        for (subscriber, error) in &failed {
            tracing::debug!(
                subscriber_id = %subscriber.id(),
                error = %error,
                "Delivery failed, detaching subscriber"
            );
            close_sink(subscriber);
        }

        tracing::debug!(
            message_id = %message.id,
            delivered,
            dropped = failed.len(),
            "Published message"
        );

        message
    }

    /// Send the current history to `subscriber`, then register it
    ///
    /// Both steps happen under the hub lock, so every message published
    /// afterwards reaches the subscriber exactly once, after its snapshot.
    /// If the history write fails, or the hub has been shut down, the
    /// subscriber is not registered and its sink is closed.
    pub fn attach_and_prime_history(&self, subscriber: &Subscriber) -> Result<(), SinkError> {
        let primed = {
            let mut state = self.lock_state();
            if self.is_shut_down() {
                drop(state);
                close_sink(subscriber);
                return Err(SinkError::Closed);
            }
            let snapshot = state.history.snapshot();
            let replayed = snapshot.len();

            subscriber.send(Frame::History(snapshot)).map(|()| {
                state.registry.register(subscriber.clone());
                (replayed, state.registry.len())
            })
        };

        match primed {
            Ok((replayed, subscribers)) => {
                tracing::info!(
                    subscriber_id = %subscriber.id(),
                    replayed,
                    subscribers,
                    "Subscriber attached"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    subscriber_id = %subscriber.id(),
                    error = %e,
                    "Failed to send history, subscriber not attached"
                );
                close_sink(subscriber);
                Err(e)
            }
        }
    }

    /// Send a keep-alive marker to one subscriber
    ///
    /// A failed write detaches the subscriber before the error is returned.
    pub fn send_liveness(&self, subscriber: &Subscriber) -> Result<(), SinkError> {
        let frame = Frame::Liveness {
            at: Utc::now().timestamp_millis(),
        };

        subscriber.send(frame).map_err(|e| {
            tracing::debug!(
                subscriber_id = %subscriber.id(),
                error = %e,
                "Keep-alive failed"
            );
            self.detach(subscriber);
            e
        })
    }

    /// Unregister a subscriber and close its sink
    ///
    /// Safe to call more than once. Returns whether the subscriber was
    /// still registered.
    pub fn detach(&self, subscriber: &Subscriber) -> bool {
        let removed = self.lock_state().registry.unregister(subscriber.id()).is_some();
        close_sink(subscriber);

        if removed {
            tracing::info!(subscriber_id = %subscriber.id(), "Subscriber detached");
        }
        removed
    }

    /// Detach every subscriber, ending their streams
    ///
    /// Later attach attempts are refused.
    pub fn shutdown(&self) -> usize {
        let drained = {
            let mut state = self.lock_state();
            self.shut_down.store(true, Ordering::SeqCst);
            state.registry.drain()
        };
        for subscriber in &drained {
            close_sink(subscriber);
        }

        tracing::info!(subscribers = drained.len(), "Event hub shut down");
        drained.len()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Number of attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock_state().registry.len()
    }

    /// Number of messages currently retained
    pub fn history_len(&self) -> usize {
        self.lock_state().history.len()
    }

    /// Copy of the retained history, oldest first
    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.lock_state().history.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn is_attached(&self, subscriber: &Subscriber) -> bool {
        self.lock_state().registry.contains(subscriber.id())
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// Best-effort close; the subscriber may already be gone
fn close_sink(subscriber: &Subscriber) {
    if let Err(e) = subscriber.close() {
        tracing::debug!(
            subscriber_id = %subscriber.id(),
            error = %e,
            "Ignoring error while closing subscriber sink"
        );
    }
}
