//! Domain layer: value objects, protocol texts and the history seam.

mod error;
mod history;
mod message;
mod model;

pub use error::{AdmissionError, DeliveryError};
#[cfg(test)]
pub use history::MockHistoryStore;
pub use history::{HistorySnapshot, HistoryStore, Sequence};
pub use message::{
    BANNER, CHAT_FULL_NOTICE, EMPTY_NAME_NOTICE, HISTORY_FOOTER, HISTORY_HEADER, Message,
    NAME_PROMPT, NAME_TAKEN_NOTICE, welcome,
};
pub use model::{ConnectionId, DisplayName};
