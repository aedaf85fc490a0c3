//! Event Stream Route
//!
//! - GET /api/events - Server-Sent Events stream of chat activity
//!
//! Each request opens a hub [`Connection`]. Its frames are drained from a
//! bounded channel into the SSE body; the connection guard lives inside
//! the body stream, so a client disconnect closes the connection as soon
//! as the body is dropped.
//!
//! A connection that closes while opening (hub shut down, or the history
//! write failed) is answered with 503 instead of an empty stream.

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures_util::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::hub::{ChannelSink, Connection, ConnectionState, Frame, SubscriberId};

/// GET /api/events
pub async fn event_stream(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let hub = Arc::clone(&state.hub);
    let (sink, rx) = ChannelSink::new(hub.config().sink_buffer);

    let connection = Connection::open(hub, sink);
    if connection.state() == ConnectionState::Closed {
        return Err(ApiError::Unavailable(
            "Event stream is not accepting subscribers".to_string(),
        ));
    }
    let guard = connection.guard();

    let stream = ReceiverStream::new(rx)
        .filter_map(move |frame| to_sse_event(guard.connection().id(), frame))
        .map(Ok);

    Ok(Sse::new(stream))
}

/// Encode a hub frame as an SSE event
///
/// Liveness markers become comment lines (`: ping <epoch-ms>`), which
/// `EventSource` consumers never see as events.
fn to_sse_event(subscriber_id: &SubscriberId, frame: Frame) -> Option<Event> {
    if let Frame::Liveness { at } = frame {
        return Some(Event::default().comment(format!("ping {}", at)));
    }

    let name = frame.event_name()?;
    match frame.payload_json() {
        Ok(data) => data.map(|data| Event::default().event(name).data(data)),
        Err(e) => {
            tracing::error!(
                subscriber_id = %subscriber_id,
                event = name,
                error = %e,
                "Failed to serialize event"
            );
            None
        }
    }
}
