//! Line-oriented multi-client TCP chat relay.
//!
//! Every line a client sends is fanned out to every other connected client,
//! with join/leave notices and a backlog of earlier lines replayed to
//! newcomers. Any line-based TCP client (e.g. `nc`) can talk to it.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
