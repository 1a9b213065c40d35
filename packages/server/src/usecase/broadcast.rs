//! UseCase: ブロードキャスト
//!
//! Append to history first, then fan out to a roster snapshot. A recipient
//! whose delivery fails is evicted on the spot and the fan-out continues.
//! Eviction never broadcasts by itself: the evicted recipient's own session
//! task is woken and announces the departure.

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, DisplayName, HistoryStore, Message, Sequence},
    infrastructure::{ConnectionRegistry, Delivery},
};

/// What one broadcast did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// History position of the message
    pub sequence: Sequence,
    /// Recipients the message was queued for
    pub delivered: usize,
    /// Recipients removed because delivery failed
    pub evicted: Vec<DisplayName>,
}

/// Broadcast Engine
pub struct BroadcastUseCase {
    registry: Arc<ConnectionRegistry>,
    history: Arc<dyn HistoryStore>,
}

impl BroadcastUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, history: Arc<dyn HistoryStore>) -> Self {
        Self { registry, history }
    }

    /// Deliver `message` to every registered recipient except `exclude`.
    pub async fn execute(&self, message: Message, exclude: Option<ConnectionId>) -> BroadcastReport {
        // 1. History first, independent of delivery outcomes
        let sequence = self.history.append(message.clone()).await;

        // 2. Snapshot, so slow deliveries never hold the registry lock
        let recipients = self.registry.snapshot().await;

        // 3. Fan out in snapshot order
        let mut delivered = 0;
        let mut evicted = Vec::new();
        for recipient in recipients.iter().filter(|r| Some(r.id()) != exclude) {
            match recipient.deliver(sequence, &message).await {
                Ok(Delivery::Sent) => {
                    delivered += 1;
                    tracing::debug!("Broadcasted message #{} to '{}'", sequence, recipient.name());
                }
                Ok(Delivery::CoveredByReplay) => {
                    tracing::debug!(
                        "Message #{} reaches '{}' through its replay",
                        sequence,
                        recipient.name()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Error broadcasting to '{}': {}. Evicting.",
                        recipient.name(),
                        e
                    );
                    if self.registry.remove(recipient).await {
                        evicted.push(recipient.name().clone());
                    }
                }
            }
        }

        BroadcastReport {
            sequence,
            delivered,
            evicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DisplayName, HistorySnapshot, MockHistoryStore},
        infrastructure::{Frame, InMemoryHistory, Recipient, outbound_channel},
    };
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 送信者以外の全員にそのまま届き、送信者には届かないこと
    // - 配信前に履歴へ追加されること
    // - 配信失敗した受信者だけが退出させられ、他の受信者には届くこと
    // ========================================

    struct Fixture {
        registry: Arc<ConnectionRegistry>,
        history: Arc<InMemoryHistory>,
        usecase: BroadcastUseCase,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new(10));
        let history = Arc::new(InMemoryHistory::new());
        let usecase = BroadcastUseCase::new(registry.clone(), history.clone());
        Fixture {
            registry,
            history,
            usecase,
        }
    }

    async fn join(
        fixture: &Fixture,
        raw: &str,
    ) -> (Arc<Recipient>, mpsc::Receiver<Frame>) {
        let (sender, receiver) = outbound_channel(16);
        let recipient = fixture
            .registry
            .try_admit(DisplayName::new(raw).unwrap(), sender)
            .await
            .unwrap();
        recipient.replay(fixture.history.as_ref()).await.unwrap();
        (recipient, receiver)
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        // テスト項目: 送信者以外の全員にメッセージがそのまま届く
        // given (前提条件):
        let fixture = fixture();
        let (alice, mut alice_rx) = join(&fixture, "alice").await;
        let (_bob, mut bob_rx) = join(&fixture, "bob").await;
        let (_charlie, mut charlie_rx) = join(&fixture, "charlie").await;

        // when (操作):
        let report = fixture
            .usecase
            .execute(Message::from_raw("[t][alice]: hi\n"), Some(alice.id()))
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert!(report.evicted.is_empty());
        let expected = Some(Frame::Line("[t][alice]: hi\n".to_string()));
        assert_eq!(bob_rx.recv().await, expected);
        assert_eq!(charlie_rx.recv().await, expected);
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_without_exclusion_reaches_everyone() {
        // テスト項目: 除外指定なしなら全員に届く
        let fixture = fixture();
        let (_alice, mut alice_rx) = join(&fixture, "alice").await;
        let (_bob, mut bob_rx) = join(&fixture, "bob").await;

        let report = fixture.usecase.execute(Message::from_raw("all\n"), None).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(alice_rx.recv().await, Some(Frame::Line("all\n".to_string())));
        assert_eq!(bob_rx.recv().await, Some(Frame::Line("all\n".to_string())));
    }

    #[tokio::test]
    async fn test_broadcast_appends_to_history_even_without_recipients() {
        // テスト項目: 受信者がいなくても履歴に追加される
        // given (前提条件):
        let fixture = fixture();

        // when (操作):
        let first = fixture.usecase.execute(Message::from_raw("one\n"), None).await;
        let second = fixture.usecase.execute(Message::from_raw("two\n"), None).await;

        // then (期待する結果):
        assert_eq!(first.delivered, 0);
        assert_eq!(second.sequence, first.sequence + 1);
        let snapshot = fixture.history.snapshot().await;
        assert_eq!(snapshot.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_evicts_unreachable_recipient_and_continues() {
        // テスト項目: 配信に失敗した受信者は退出させられ、残りの受信者には届く
        // given (前提条件): bob の書き込みタスクは既に終了している
        let fixture = fixture();
        let (alice, _alice_rx) = join(&fixture, "alice").await;
        let (bob, bob_rx) = join(&fixture, "bob").await;
        let (_charlie, mut charlie_rx) = join(&fixture, "charlie").await;
        drop(bob_rx);

        // when (操作):
        let report = fixture
            .usecase
            .execute(Message::from_raw("[t][alice]: hello\n"), Some(alice.id()))
            .await;

        // then (期待する結果):
        assert_eq!(report.evicted, vec![bob.name().clone()]);
        assert_eq!(report.delivered, 1);
        assert_eq!(
            charlie_rx.recv().await,
            Some(Frame::Line("[t][alice]: hello\n".to_string()))
        );
        let names: Vec<String> = fixture
            .registry
            .snapshot()
            .await
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["alice".to_string(), "charlie".to_string()]);
    }

    #[tokio::test]
    async fn test_broadcast_appends_before_delivery() {
        // テスト項目: 履歴への追加は 1 回だけ行われ、返されたシーケンスで配信される
        // given (前提条件):
        let mut history = MockHistoryStore::new();
        history.expect_snapshot().returning(|| HistorySnapshot {
            entries: Vec::new(),
            next_sequence: 7,
        });
        history
            .expect_append()
            .withf(|message| message.as_str() == "ping\n")
            .times(1)
            .returning(|_| 7);
        let history: Arc<dyn HistoryStore> = Arc::new(history);
        let registry = Arc::new(ConnectionRegistry::new(10));
        let usecase = BroadcastUseCase::new(registry.clone(), history.clone());

        let (sender, mut receiver) = outbound_channel(16);
        let alice = registry
            .try_admit(DisplayName::new("alice").unwrap(), sender)
            .await
            .unwrap();
        alice.replay(history.as_ref()).await.unwrap();

        // when (操作):
        let report = usecase.execute(Message::from_raw("ping\n"), None).await;

        // then (期待する結果):
        assert_eq!(report.sequence, 7);
        assert_eq!(receiver.recv().await, Some(Frame::Line("ping\n".to_string())));
    }
}
