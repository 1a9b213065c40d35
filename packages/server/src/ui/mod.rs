//! TCP front end: accept loop and per-connection sessions.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::handle_connection;
pub use server::{ChatServer, ServerError};
pub use signal::shutdown_signal;
pub use state::AppState;
