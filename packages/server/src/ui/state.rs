//! Server state shared by every connection task.

use std::{sync::Arc, time::Duration};

use tcpchat_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::HistoryStore,
    infrastructure::{ConnectionRegistry, InMemoryHistory},
    usecase::{BroadcastUseCase, JoinChatUseCase, LeaveChatUseCase, SendMessageUseCase},
};

/// Shared application state
pub struct AppState {
    /// Connection Registry, also used for the accept-time capacity check
    pub registry: Arc<ConnectionRegistry>,
    pub join_chat_usecase: Arc<JoinChatUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub leave_chat_usecase: Arc<LeaveChatUseCase>,
    /// Deadline for the name handshake
    pub name_timeout: Duration,
    /// Per-recipient outbound queue size
    pub outbound_queue_capacity: usize,
    /// Line length caps, in bytes, for the name and for chat lines
    pub max_name_length: usize,
    pub max_line_length: usize,
}

impl AppState {
    /// Wire registry, history and use cases from the configuration.
    pub fn from_config(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // 1. Shared state: registry and history
        let registry = Arc::new(ConnectionRegistry::new(config.max_connections));
        let history: Arc<dyn HistoryStore> =
            Arc::new(InMemoryHistory::with_limit(config.history_limit));

        // 2. UseCases
        let broadcast = Arc::new(BroadcastUseCase::new(registry.clone(), history.clone()));
        let join_chat_usecase = Arc::new(JoinChatUseCase::new(
            registry.clone(),
            history,
            broadcast.clone(),
        ));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(broadcast.clone(), clock));
        let leave_chat_usecase = Arc::new(LeaveChatUseCase::new(registry.clone(), broadcast));

        Self {
            registry,
            join_chat_usecase,
            send_message_usecase,
            leave_chat_usecase,
            name_timeout: config.name_timeout,
            outbound_queue_capacity: config.outbound_queue_capacity,
            max_name_length: config.max_name_length,
            max_line_length: config.max_line_length,
        }
    }
}
