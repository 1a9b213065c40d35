//! History Log seam.
//!
//! The broadcast path writes to it and the replay path reads from it.
//! The concrete store lives in the infrastructure layer.

use async_trait::async_trait;

use super::{HISTORY_FOOTER, HISTORY_HEADER, Message};

/// Position of a message in the history, assigned at append time.
pub type Sequence = u64;

/// Consistent prefix of the history taken for a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    /// Retained messages, oldest first
    pub entries: Vec<Message>,
    /// Sequence the next appended message will get
    pub next_sequence: Sequence,
}

impl HistorySnapshot {
    /// Lines to write to a newcomer, one write each.
    ///
    /// Empty when there is nothing to replay: no header, no footer.
    pub fn replay_lines(&self) -> Vec<String> {
        if self.entries.is_empty() {
            return Vec::new();
        }

        let mut lines = Vec::with_capacity(self.entries.len() + 2);
        lines.push(HISTORY_HEADER.to_string());
        lines.extend(self.entries.iter().map(|m| m.as_str().to_string()));
        lines.push(HISTORY_FOOTER.to_string());
        lines
    }
}

/// Append-only record of every broadcast message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Add a message at the tail and return its sequence.
    async fn append(&self, message: Message) -> Sequence;

    /// Every message appended before this call, in order.
    async fn snapshot(&self) -> HistorySnapshot;
}
