//! Publish Route
//!
//! - POST /api/message - Publish a chat message to every subscriber
//!
//! The body is read as JSON whatever its `Content-Type`.

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{PublishRequest, PublishResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::hub::MessageDraft;

/// POST /api/message
///
/// Validates and normalizes the request, publishes it through the hub and
/// returns the stored message.
pub async fn publish_message(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<PublishResponse>> {
    let value: serde_json::Value = serde_json::from_slice(&body)?;
    let req = PublishRequest::from_json(&value);

    let draft = MessageDraft::new(
        req.user.as_deref(),
        req.text.as_deref().unwrap_or_default(),
        &state.hub.config().limits,
    )?;

    let message = state.hub.publish(draft);
    tracing::info!(message_id = %message.id, user = %message.user, "Message published");

    Ok(Json(PublishResponse { ok: true, message }))
}
