//! Stream Frames
//!
//! The units the hub writes to a subscriber's sink. Domain frames are
//! named events with a JSON payload; the liveness frame is a transport
//! comment that event consumers ignore.

use super::message::ChatMessage;

/// One unit written to a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Snapshot of recent history, oldest first. Always the first frame.
    History(Vec<ChatMessage>),
    /// A single newly published message
    Message(ChatMessage),
    /// Keep-alive marker carrying the send time (epoch ms)
    Liveness { at: i64 },
}

impl Frame {
    /// Event name for domain frames, `None` for liveness markers
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            Frame::History(_) => Some("history"),
            Frame::Message(_) => Some("message"),
            Frame::Liveness { .. } => None,
        }
    }

    /// JSON payload of a domain frame
    pub fn payload_json(&self) -> serde_json::Result<Option<String>> {
        match self {
            Frame::History(messages) => serde_json::to_string(messages).map(Some),
            Frame::Message(message) => serde_json::to_string(message).map(Some),
            Frame::Liveness { .. } => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ChatMessage {
        ChatMessage {
            id: "m-1".to_string(),
            user: "alice".to_string(),
            text: "hi".to_string(),
            created_at: 1_699_000_000_000,
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(Frame::History(vec![]).event_name(), Some("history"));
        assert_eq!(Frame::Message(message()).event_name(), Some("message"));
        assert_eq!(Frame::Liveness { at: 1 }.event_name(), None);
    }

    #[test]
    fn test_history_payload_is_array() {
        let json = Frame::History(vec![message()]).payload_json().unwrap().unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"createdAt\":1699000000000"));
    }

    #[test]
    fn test_liveness_has_no_payload() {
        let frame = Frame::Liveness { at: 42 };
        assert!(frame.payload_json().unwrap().is_none());
    }
}
