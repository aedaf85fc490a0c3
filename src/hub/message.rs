//! Chat Message Types
//!
//! Defines the immutable message value that flows through the hub and the
//! validated draft that publishers hand to it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Display name used when a publisher does not supply one
pub const DEFAULT_USER: &str = "Anonymous";

/// A published chat message
///
/// Created by the hub at publish time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message identifier (UUID v4)
    pub id: String,
    /// Display name of the author
    pub user: String,
    /// Message body
    pub text: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
}

impl ChatMessage {
    pub(crate) fn from_draft(draft: MessageDraft, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: draft.user,
            text: draft.text,
            created_at,
        }
    }
}

/// Length bounds applied to publisher input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    /// Maximum author length in characters
    pub max_user_len: usize,
    /// Maximum body length in characters
    pub max_text_len: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            max_user_len: 64,
            max_text_len: 2000,
        }
    }
}

/// Validated, normalized input for [`EventHub::publish`](super::EventHub::publish)
///
/// The only way to build one is [`MessageDraft::new`], so every draft that
/// reaches the hub has a non-empty body and bounded field lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    user: String,
    text: String,
}

impl MessageDraft {
    /// Validate and normalize raw publisher input
    ///
    /// Both fields are truncated to the configured limits. The body is
    /// trimmed and must not be empty; a blank author falls back to
    /// [`DEFAULT_USER`].
    pub fn new(user: Option<&str>, text: &str, limits: &MessageLimits) -> Result<Self, DraftError> {
        let text = truncate_chars(text, limits.max_text_len).trim();
        if text.is_empty() {
            return Err(DraftError::EmptyText);
        }

        let user = user
            .map(|u| truncate_chars(u, limits.max_user_len).trim())
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_USER);

        Ok(Self {
            user: user.to_string(),
            text: text.to_string(),
        })
    }

    /// Author display name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Message body
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Reasons a draft is rejected before it reaches the hub
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Message cannot be empty")]
    EmptyText,
}

/// Cut `s` to at most `max` Unicode scalar values
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_valid() {
        let draft = MessageDraft::new(Some("alice"), "hi", &MessageLimits::default()).unwrap();
        assert_eq!(draft.user(), "alice");
        assert_eq!(draft.text(), "hi");
    }

    #[test]
    fn test_draft_rejects_whitespace() {
        let result = MessageDraft::new(Some("alice"), "   \n\t", &MessageLimits::default());
        assert_eq!(result.unwrap_err(), DraftError::EmptyText);
    }

    #[test]
    fn test_draft_default_user() {
        let limits = MessageLimits::default();
        assert_eq!(MessageDraft::new(None, "hi", &limits).unwrap().user(), DEFAULT_USER);
        assert_eq!(MessageDraft::new(Some("  "), "hi", &limits).unwrap().user(), DEFAULT_USER);
    }

    #[test]
    fn test_draft_truncates() {
        let limits = MessageLimits {
            max_user_len: 3,
            max_text_len: 5,
        };
        let draft = MessageDraft::new(Some("alice"), "hello world", &limits).unwrap();
        assert_eq!(draft.user(), "ali");
        assert_eq!(draft.text(), "hello");
    }

    #[test]
    fn test_draft_truncates_on_char_boundary() {
        let limits = MessageLimits {
            max_user_len: 2,
            max_text_len: 3,
        };
        let draft = MessageDraft::new(Some("ééé"), "日本語です", &limits).unwrap();
        assert_eq!(draft.user(), "éé");
        assert_eq!(draft.text(), "日本語");
    }

    #[test]
    fn test_message_json_shape() {
        let draft = MessageDraft::new(Some("alice"), "hi", &MessageLimits::default()).unwrap();
        let msg = ChatMessage::from_draft(draft, 1_699_000_000_000);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["user"], "alice");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["createdAt"], 1_699_000_000_000_i64);
        assert!(json["id"].as_str().is_some_and(|id| !id.is_empty()));
    }
}
