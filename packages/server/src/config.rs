//! Server configuration.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8989;
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;
/// Idle handshakes are dropped after this long to free their seat.
pub const DEFAULT_NAME_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_MAX_NAME_LENGTH: usize = 1024;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;

/// Runtime settings of the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Registry capacity
    pub max_connections: usize,
    /// Deadline for a new connection to send its name
    pub name_timeout: Duration,
    /// Frames a recipient may have pending before it counts as unreachable
    pub outbound_queue_capacity: usize,
    /// Newest messages kept for replay; `None` keeps everything
    pub history_limit: Option<usize>,
    /// Longest name line in bytes, newline excluded
    pub max_name_length: usize,
    /// Longest chat line in bytes, newline excluded
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            name_timeout: DEFAULT_NAME_TIMEOUT,
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
            history_limit: None,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port number: {0:?} is not a number")]
    PortNotNumeric(String),

    #[error("Invalid port number: {0} is <0 or >65535")]
    PortOutOfRange(String),
}

/// Parse the port argument, accepting 0 through 65535.
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let trimmed = raw.trim();
    trimmed.parse().map_err(|_| {
        let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            ConfigError::PortOutOfRange(trimmed.to_string())
        } else {
            ConfigError::PortNotNumeric(raw.to_string())
        }
    })
}
