//! UseCase: 退室処理

use std::sync::Arc;

use crate::{
    domain::Message,
    infrastructure::{ConnectionRegistry, Recipient},
};

use super::{BroadcastReport, BroadcastUseCase};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The peer closed the stream
    Closed,
    /// A broadcast could not reach the peer and the registry dropped it
    Evicted,
    /// Reading from the peer failed
    ReadError,
    /// The peer sent an empty line
    EmptyLine,
    /// The peer sent a line over the length limit
    LineTooLong,
}

impl Departure {
    /// Whether the remaining participants are told about it.
    pub fn is_announced(&self) -> bool {
        matches!(self, Departure::Closed | Departure::Evicted)
    }
}

pub struct LeaveChatUseCase {
    registry: Arc<ConnectionRegistry>,
    broadcast: Arc<BroadcastUseCase>,
}

impl LeaveChatUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, broadcast: Arc<BroadcastUseCase>) -> Self {
        Self {
            registry,
            broadcast,
        }
    }

    /// Remove the participant and, for peer departures, tell the others.
    ///
    /// Only the recipient's own session calls this, so a notice goes out at
    /// most once per participant.
    pub async fn execute(
        &self,
        recipient: &Recipient,
        departure: Departure,
    ) -> Option<BroadcastReport> {
        self.registry.remove(recipient).await;
        tracing::info!("'{}' left the chat ({:?})", recipient.name(), departure);

        if !departure.is_announced() {
            return None;
        }
        let report = self
            .broadcast
            .execute(Message::left(recipient.name()), Some(recipient.id()))
            .await;
        Some(report)
    }
}
