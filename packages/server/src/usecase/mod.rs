//! UseCase layer: what happens when participants join, talk and leave.

mod broadcast;
mod join_chat;
mod leave_chat;
mod send_message;

pub use broadcast::{BroadcastReport, BroadcastUseCase};
pub use join_chat::JoinChatUseCase;
pub use leave_chat::{Departure, LeaveChatUseCase};
pub use send_message::SendMessageUseCase;
