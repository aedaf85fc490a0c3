//! Connection Lifecycle
//!
//! Per-connection state machine: `Connecting → Active → Closed`.
//!
//! Opening a connection primes it with history, registers it with the hub
//! and starts its keep-alive task. Any of keep-alive failure, client
//! disconnect or shutdown closes it: the task is cancelled and the
//! subscriber detached. Closed is terminal; a reconnecting client gets a
//! new `Connection`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::event_hub::EventHub;
use super::sink::EventSink;
use super::subscriber::{Subscriber, SubscriberId};

const MIN_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closed,
}

/// Why a connection was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The initial history write failed
    PrimeFailed,
    /// A keep-alive write failed
    KeepAliveFailed,
    /// The transport went away
    ClientDisconnected,
    /// Server-initiated close
    Shutdown,
}

struct Inner {
    state: ConnectionState,
    keepalive: Option<JoinHandle<()>>,
}

/// One attached client stream
pub struct Connection {
    hub: Arc<EventHub>,
    subscriber: Subscriber,
    inner: Mutex<Inner>,
}

impl Connection {
    /// Attach a new connection writing to `sink`
    ///
    /// Must be called from within a tokio runtime. If the history write
    /// fails the returned connection is already closed.
    pub fn open(hub: Arc<EventHub>, sink: Arc<dyn EventSink>) -> Arc<Self> {
        let interval = hub.config().keepalive_interval.max(MIN_KEEPALIVE_INTERVAL);
        let connection = Arc::new(Self {
            hub,
            subscriber: Subscriber::new(sink),
            inner: Mutex::new(Inner {
                state: ConnectionState::Connecting,
                keepalive: None,
            }),
        });

        if connection.hub.attach_and_prime_history(&connection.subscriber).is_err() {
            connection.close(CloseReason::PrimeFailed);
            return connection;
        }

        let task = tokio::spawn(keepalive_loop(Arc::downgrade(&connection), interval));

        let mut inner = connection.lock_inner();
        if inner.state == ConnectionState::Connecting {
            inner.state = ConnectionState::Active;
            inner.keepalive = Some(task);
        } else {
            // Closed while the task was being spawned
            task.abort();
        }
        drop(inner);

        connection
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &SubscriberId {
        self.subscriber.id()
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_inner().state
    }

    /// Close the connection
    ///
    /// Cancels the keep-alive task and detaches the subscriber. Returns
    /// `false` if it was already closed, in which case nothing happens.
    pub fn close(&self, reason: CloseReason) -> bool {
        let keepalive = {
            let mut inner = self.lock_inner();
            if inner.state == ConnectionState::Closed {
                return false;
            }
            inner.state = ConnectionState::Closed;
            inner.keepalive.take()
        };

        if let Some(task) = keepalive {
            task.abort();
        }
        self.hub.detach(&self.subscriber);

        tracing::debug!(subscriber_id = %self.id(), reason = ?reason, "Connection closed");
        true
    }

    /// Guard that closes this connection when dropped
    pub fn guard(self: &Arc<Self>) -> ConnectionGuard {
        ConnectionGuard(Arc::clone(self))
    }
}

/// Ties a connection to the lifetime of its transport
///
/// The stream adapter moves this into the response body; when the client
/// goes away the body is dropped and the connection closes.
pub struct ConnectionGuard(Arc<Connection>);

impl ConnectionGuard {
    pub fn connection(&self) -> &Arc<Connection> {
        &self.0
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let reason = if self.0.hub.is_shut_down() {
            CloseReason::Shutdown
        } else {
            CloseReason::ClientDisconnected
        };
        self.0.close(reason);
    }
}

async fn keepalive_loop(weak: Weak<Connection>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(connection) = weak.upgrade() else {
            break;
        };
        if connection.hub.send_liveness(&connection.subscriber).is_err() {
            connection.close(CloseReason::KeepAliveFailed);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::event_hub::HubConfig;
    use crate::hub::frame::Frame;
    use crate::hub::message::{MessageDraft, MessageLimits};
    use crate::hub::sink::ChannelSink;

    fn hub_with_interval(secs: u64) -> Arc<EventHub> {
        Arc::new(EventHub::new(HubConfig {
            keepalive_interval: Duration::from_secs(secs),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn test_open_primes_and_activates() {
        let hub = hub_with_interval(30);
        hub.publish(MessageDraft::new(None, "earlier", &MessageLimits::default()).unwrap());

        let (sink, mut rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);

        assert_eq!(conn.state(), ConnectionState::Active);
        assert_eq!(hub.subscriber_count(), 1);
        match rx.recv().await {
            Some(Frame::History(history)) => assert_eq!(history[0].text, "earlier"),
            other => panic!("Expected history frame, got {:?}", other),
        }

        conn.close(CloseReason::Shutdown);
    }

    #[tokio::test]
    async fn test_open_with_dead_sink_closes() {
        let hub = hub_with_interval(30);
        let (sink, rx) = ChannelSink::new(16);
        drop(rx);

        let conn = Connection::open(Arc::clone(&hub), sink);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let hub = hub_with_interval(30);
        let (sink, _rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);

        assert!(conn.close(CloseReason::Shutdown));
        assert!(!conn.close(CloseReason::ClientDisconnected));
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_ticks() {
        let hub = hub_with_interval(30);
        let (sink, mut rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);
        assert!(matches!(rx.recv().await, Some(Frame::History(_))));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(rx.recv().await, Some(Frame::Liveness { .. })));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(matches!(rx.recv().await, Some(Frame::Liveness { .. })));

        conn.close(CloseReason::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_failure_closes() {
        let hub = hub_with_interval(30);
        let (sink, rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);
        assert_eq!(hub.subscriber_count(), 1);

        drop(rx);
        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_keepalive() {
        let hub = hub_with_interval(30);
        let (sink, mut rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);
        assert!(matches!(rx.recv().await, Some(Frame::History(_))));

        conn.close(CloseReason::Shutdown);
        tokio::time::sleep(Duration::from_secs(120)).await;

        // Sender dropped by close, and no liveness frames were queued
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_guard_drop_detaches() {
        let hub = hub_with_interval(30);
        let (sink, _rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);
        let guard = conn.guard();
        assert_eq!(hub.subscriber_count(), 1);

        drop(guard);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_hub_shutdown_ends_stream() {
        let hub = hub_with_interval(30);
        let (sink, mut rx) = ChannelSink::new(16);
        let conn = Connection::open(Arc::clone(&hub), sink);
        assert!(matches!(rx.recv().await, Some(Frame::History(_))));

        hub.shutdown();
        assert_eq!(rx.recv().await, None);

        // The transport drops its guard once the stream ends
        drop(conn.guard());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }
}
