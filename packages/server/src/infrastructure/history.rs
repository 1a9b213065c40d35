//! InMemory History Log 実装
//!
//! Unbounded by default. With a limit it behaves as a ring buffer that
//! drops the oldest entries; sequences keep counting either way.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{HistorySnapshot, HistoryStore, Message, Sequence};

/// In-memory, process-lifetime history of broadcast messages.
pub struct InMemoryHistory {
    state: Mutex<HistoryState>,
}

struct HistoryState {
    entries: VecDeque<Message>,
    next_sequence: Sequence,
    limit: Option<usize>,
}

impl InMemoryHistory {
    /// History that keeps every message.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// History that keeps at most `limit` newest messages when set.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: VecDeque::new(),
                next_sequence: 0,
                limit,
            }),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append(&self, message: Message) -> Sequence {
        let mut state = self.state.lock().await;
        state.entries.push_back(message);
        if let Some(limit) = state.limit {
            while state.entries.len() > limit {
                state.entries.pop_front();
            }
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        sequence
    }

    async fn snapshot(&self) -> HistorySnapshot {
        let state = self.state.lock().await;
        HistorySnapshot {
            entries: state.entries.iter().cloned().collect(),
            next_sequence: state.next_sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_increasing_sequences() {
        // テスト項目: 追加ごとに連番のシーケンスが割り当てられる
        // given (前提条件):
        let history = InMemoryHistory::new();

        // when (操作):
        let first = history.append(Message::from_raw("one\n")).await;
        let second = history.append(Message::from_raw("two\n")).await;

        // then (期待する結果):
        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_append_order() {
        // テスト項目: スナップショットが追加順を保持する
        // given (前提条件):
        let history = InMemoryHistory::new();
        for text in ["one\n", "two\n", "three\n"] {
            history.append(Message::from_raw(text)).await;
        }

        // when (操作):
        let snapshot = history.snapshot().await;

        // then (期待する結果):
        let texts: Vec<&str> = snapshot.entries.iter().map(|m| m.as_str()).collect();
        assert_eq!(texts, vec!["one\n", "two\n", "three\n"]);
        assert_eq!(snapshot.next_sequence, 3);
    }

    #[tokio::test]
    async fn test_empty_history_snapshot() {
        // テスト項目: 空の履歴のスナップショットは空
        let history = InMemoryHistory::default();

        let snapshot = history.snapshot().await;

        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.next_sequence, 0);
    }

    #[tokio::test]
    async fn test_limit_drops_oldest_entries() {
        // テスト項目: 上限を超えると最も古いメッセージから破棄される
        // given (前提条件):
        let history = InMemoryHistory::with_limit(Some(2));

        // when (操作):
        for text in ["one\n", "two\n", "three\n"] {
            history.append(Message::from_raw(text)).await;
        }
        let snapshot = history.snapshot().await;

        // then (期待する結果): シーケンスは破棄に関係なく進む
        let texts: Vec<&str> = snapshot.entries.iter().map(|m| m.as_str()).collect();
        assert_eq!(texts, vec!["two\n", "three\n"]);
        assert_eq!(snapshot.next_sequence, 3);
    }
}
