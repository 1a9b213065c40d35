//! UseCase: 入室処理
//!
//! Admission, welcome line, history replay and the join notice, in that
//! order.

use std::sync::Arc;

use crate::{
    domain::{AdmissionError, DisplayName, HistoryStore, Message, welcome},
    infrastructure::{ConnectionRegistry, OutboundSender, Recipient},
};

use super::BroadcastUseCase;

pub struct JoinChatUseCase {
    registry: Arc<ConnectionRegistry>,
    history: Arc<dyn HistoryStore>,
    broadcast: Arc<BroadcastUseCase>,
}

impl JoinChatUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        history: Arc<dyn HistoryStore>,
        broadcast: Arc<BroadcastUseCase>,
    ) -> Self {
        Self {
            registry,
            history,
            broadcast,
        }
    }

    /// Admit a participant and bring them up to date.
    ///
    /// # Arguments
    ///
    /// * `name` - Negotiated display name
    /// * `sender` - Outbound queue of the new connection
    ///
    /// # Errors
    ///
    /// Returns the `AdmissionError` from the registry; nothing is sent or
    /// recorded in that case.
    pub async fn execute(
        &self,
        name: DisplayName,
        sender: OutboundSender,
    ) -> Result<Arc<Recipient>, AdmissionError> {
        let recipient = self.registry.try_admit(name, sender).await?;
        tracing::info!("'{}' joined the chat ({})", recipient.name(), recipient.id());

        // A failure here means the writer is already gone; the session's
        // read loop sees the disconnect on its own.
        if let Err(e) = recipient.send_direct(welcome(recipient.name())).await {
            tracing::warn!("Failed to welcome '{}': {}", recipient.name(), e);
        }
        match recipient.replay(self.history.as_ref()).await {
            Ok(count) => tracing::debug!("Replayed {} messages to '{}'", count, recipient.name()),
            Err(e) => tracing::warn!("Failed to replay history to '{}': {}", recipient.name(), e),
        }

        self.broadcast
            .execute(Message::joined(recipient.name()), Some(recipient.id()))
            .await;

        Ok(recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Frame, InMemoryHistory, outbound_channel};
    use tokio::sync::mpsc;

    struct Fixture {
        registry: Arc<ConnectionRegistry>,
        history: Arc<InMemoryHistory>,
        usecase: JoinChatUseCase,
    }

    fn fixture(capacity: usize) -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new(capacity));
        let history = Arc::new(InMemoryHistory::new());
        let broadcast = Arc::new(BroadcastUseCase::new(registry.clone(), history.clone()));
        let usecase = JoinChatUseCase::new(registry.clone(), history.clone(), broadcast);
        Fixture {
            registry,
            history,
            usecase,
        }
    }

    async fn join(
        fixture: &Fixture,
        raw: &str,
    ) -> Result<(Arc<Recipient>, mpsc::Receiver<Frame>), AdmissionError> {
        let (sender, receiver) = outbound_channel(16);
        let recipient = fixture
            .usecase
            .execute(DisplayName::new(raw).unwrap(), sender)
            .await?;
        Ok((recipient, receiver))
    }

    #[tokio::test]
    async fn test_first_participant_gets_welcome_only() {
        // テスト項目: 履歴が空の場合、歓迎メッセージのみ届きリプレイは出力されない
        // given (前提条件):
        let fixture = fixture(10);

        // when (操作):
        let (_alice, mut alice_rx) = join(&fixture, "Alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(
            alice_rx.recv().await,
            Some(Frame::Line("Welcome to the chat, Alice!\n".to_string()))
        );
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_notice_goes_to_others_and_history() {
        // テスト項目: 入室通知は本人以外に届き、履歴にも残る
        // given (前提条件):
        let fixture = fixture(10);
        let (_alice, mut alice_rx) = join(&fixture, "Alice").await.unwrap();
        alice_rx.recv().await;

        // when (操作):
        let (_bob, mut bob_rx) = join(&fixture, "Bob").await.unwrap();

        // then (期待する結果):
        assert_eq!(
            alice_rx.recv().await,
            Some(Frame::Line("\nBob has joined our chat...\n".to_string()))
        );
        assert_eq!(
            bob_rx.recv().await,
            Some(Frame::Line("Welcome to the chat, Bob!\n".to_string()))
        );
        // Bob's replay holds Alice's join only, never his own
        assert_eq!(
            bob_rx.recv().await,
            Some(Frame::Batch(vec![
                "\n Previous Messages \n".to_string(),
                "\nAlice has joined our chat...\n".to_string(),
                " End Of Previous Messages \n\n".to_string(),
            ]))
        );
        assert!(bob_rx.try_recv().is_err());
        assert_eq!(fixture.history.snapshot().await.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_reproduces_history_verbatim() {
        // テスト項目: 既存の履歴がヘッダーとフッターに挟まれて順番通りに再生される
        // given (前提条件):
        let fixture = fixture(10);
        fixture
            .history
            .append(Message::from_raw("[2024-01-02 03:04:05][A]: one\n"))
            .await;
        fixture
            .history
            .append(Message::from_raw("[2024-01-02 03:04:06][B]: two\n"))
            .await;

        // when (操作):
        let (_carol, mut carol_rx) = join(&fixture, "Carol").await.unwrap();

        // then (期待する結果):
        carol_rx.recv().await;
        assert_eq!(
            carol_rx.recv().await,
            Some(Frame::Batch(vec![
                "\n Previous Messages \n".to_string(),
                "[2024-01-02 03:04:05][A]: one\n".to_string(),
                "[2024-01-02 03:04:06][B]: two\n".to_string(),
                " End Of Previous Messages \n\n".to_string(),
            ]))
        );
    }

    #[tokio::test]
    async fn test_rejected_join_leaves_no_trace() {
        // テスト項目: 入室拒否時は登録も履歴追加も行われない
        // given (前提条件):
        let fixture = fixture(1);
        let _alice = join(&fixture, "alice").await.unwrap();

        // when (操作):
        let duplicate = join(&fixture, "ALICE").await;
        let full = join(&fixture, "bob").await;

        // then (期待する結果):
        assert!(matches!(duplicate, Err(AdmissionError::DuplicateName(_))));
        assert!(matches!(full, Err(AdmissionError::Full)));
        assert_eq!(fixture.registry.len().await, 1);
        assert_eq!(fixture.history.snapshot().await.entries.len(), 1);
    }
}
