//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::Serialize;
use serde_json::Value;

use crate::hub::ChatMessage;

// ============================================
// PUBLISH DTOs
// ============================================

/// Publish request
///
/// Any JSON value is accepted. Scalar fields are coerced to strings and
/// anything else is left for `MessageDraft` validation to reject.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PublishRequest {
    /// Author display name (`user`, or `author`)
    pub user: Option<String>,
    /// Message body (`text`, or `body`)
    pub text: Option<String>,
}

impl PublishRequest {
    /// Build a request from a parsed JSON body
    pub fn from_json(value: &Value) -> Self {
        Self {
            user: field(value, "user", "author"),
            text: field(value, "text", "body"),
        }
    }
}

/// First non-null of `name` or `alias`, coerced to a string
fn field(value: &Value, name: &str, alias: &str) -> Option<String> {
    let raw = match value.get(name) {
        Some(Value::Null) | None => value.get(alias)?,
        Some(v) => v,
    };

    match raw {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Publish response
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub ok: bool,
    /// The stored message, as broadcast to subscribers
    pub message: ChatMessage,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Currently attached event-stream subscribers
    pub subscribers: usize,
    /// Messages retained for replay
    pub history_len: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_request_fields() {
        let req = PublishRequest::from_json(&json!({"user": "alice", "text": "hi"}));
        assert_eq!(req.user.as_deref(), Some("alice"));
        assert_eq!(req.text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_publish_request_aliases() {
        let req = PublishRequest::from_json(&json!({"author": "bob", "body": "yo"}));
        assert_eq!(req.user.as_deref(), Some("bob"));
        assert_eq!(req.text.as_deref(), Some("yo"));
    }

    #[test]
    fn test_publish_request_empty_object() {
        assert_eq!(PublishRequest::from_json(&json!({})), PublishRequest::default());
    }

    #[test]
    fn test_publish_request_coerces_scalars() {
        let req = PublishRequest::from_json(&json!({"user": 42, "text": true}));
        assert_eq!(req.user.as_deref(), Some("42"));
        assert_eq!(req.text.as_deref(), Some("true"));

        let req = PublishRequest::from_json(&json!({"user": null, "text": 1.5}));
        assert_eq!(req.user, None);
        assert_eq!(req.text.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_publish_request_non_object_body() {
        assert_eq!(PublishRequest::from_json(&json!("hello")), PublishRequest::default());
        assert_eq!(PublishRequest::from_json(&json!([1, 2])), PublishRequest::default());
    }
}
