//! UseCase: メッセージ送信処理

use std::sync::Arc;

use tcpchat_shared::time::{Clock, format_chat_timestamp};

use crate::{domain::Message, infrastructure::Recipient};

use super::{BroadcastReport, BroadcastUseCase};

/// Stamps a line with time and sender, then broadcasts it to everyone else.
pub struct SendMessageUseCase {
    broadcast: Arc<BroadcastUseCase>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(broadcast: Arc<BroadcastUseCase>, clock: Arc<dyn Clock>) -> Self {
        Self { broadcast, clock }
    }

    pub async fn execute(&self, from: &Recipient, body: &str) -> BroadcastReport {
        let timestamp = format_chat_timestamp(&self.clock.now());
        let message = Message::chat(&timestamp, from.name(), body);
        tracing::debug!("'{}' says: {}", from.name(), body);
        self.broadcast.execute(message, Some(from.id())).await
    }
}
