//! Bounded log of emitted messages, for display and debugging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of messages retained.
pub const HISTORY_CAPACITY: usize = 30;

/// One emitted message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// Address followed by the serialized payload
    pub description: String,
}

/// FIFO buffer of the most recent messages; the oldest entry is evicted
/// once capacity is exceeded.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, description: String) {
        self.entries.push_back(HistoryEntry {
            timestamp: Utc::now(),
            description,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Descriptions, oldest first.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.description.as_str())
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
