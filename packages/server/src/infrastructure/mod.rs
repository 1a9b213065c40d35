//! Infrastructure layer: shared in-memory state and socket writers.

pub mod history;
pub mod registry;
pub mod stream_writer;

pub use history::InMemoryHistory;
pub use registry::{ConnectionRegistry, Delivery, Recipient};
pub use stream_writer::{Frame, OutboundSender, outbound_channel, spawn_stream_writer};
