//! Utilities shared by the TCP chat binaries and their tests.

pub mod logger;
pub mod time;
