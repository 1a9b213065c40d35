//! Domain errors.

use thiserror::Error;

use super::message::{CHAT_FULL_NOTICE, EMPTY_NAME_NOTICE, NAME_TAKEN_NOTICE};

/// Reasons a connection is refused a seat in the chat.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// Another active participant already uses this name (case-insensitive)
    #[error("Name '{0}' is already taken")]
    DuplicateName(String),

    /// The registry is at capacity
    #[error("Chat is full")]
    Full,

    /// The client sent a blank name
    #[error("Name cannot be empty")]
    EmptyName,
}

impl AdmissionError {
    /// Fixed text written to the rejected client before the connection is closed.
    pub fn client_notice(&self) -> &'static str {
        match self {
            AdmissionError::DuplicateName(_) => NAME_TAKEN_NOTICE,
            AdmissionError::Full => CHAT_FULL_NOTICE,
            AdmissionError::EmptyName => EMPTY_NAME_NOTICE,
        }
    }
}

/// Failure to hand a message to one recipient.
///
/// Always scoped to a single recipient; a broadcast keeps going after one.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient's connection has been closed or its writer has stopped
    #[error("Recipient connection is closed")]
    Closed,

    /// The recipient is not reading and its outbound queue is full
    #[error("Recipient outbound queue is full")]
    Backlogged,
}
