//! Bounded History Log
//!
//! Append-only, in-memory record of the most recent messages. The log is
//! not synchronized on its own; the hub keeps it behind the same lock as
//! the subscriber registry.

use std::collections::VecDeque;

use super::message::ChatMessage;

/// Default number of messages retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Bounded, oldest-first sequence of recent messages
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<ChatMessage>,
    capacity: usize,
}

impl HistoryLog {
    /// Create an empty log that retains at most `capacity` messages
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head once over capacity
    pub fn append(&mut self, message: ChatMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Independent copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
