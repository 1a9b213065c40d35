//! Multi-client TCP chat relay.
//!
//! Lines sent by one client are relayed to every other client, with
//! join/leave notices and a replay of earlier lines for newcomers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tcpchat
//! cargo run --bin tcpchat -- 2525
//! nc localhost 2525
//! ```

use std::sync::Arc;

use clap::Parser;
use tcpchat_server::{
    config::{DEFAULT_PORT, ServerConfig, parse_port},
    ui::{AppState, ChatServer},
};
use tcpchat_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tcpchat")]
#[command(about = "Multi-client TCP chat relay", long_about = None)]
#[command(override_usage = "tcpchat [PORT]")]
struct Args {
    /// Port to listen on (0-65535, default 8989)
    #[arg(allow_hyphen_values = true)]
    port: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&["tcpchat_server", env!("CARGO_BIN_NAME")], "info");

    let args = Args::parse();

    // 1. Configuration
    let port = match args.port.as_deref().map(parse_port).transpose() {
        Ok(port) => port.unwrap_or(DEFAULT_PORT),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let config = ServerConfig {
        port,
        ..ServerConfig::default()
    };

    // 2. Shared state and use cases
    let state = Arc::new(AppState::from_config(&config, Arc::new(SystemClock)));

    // 3. Bind and serve
    let server = match ChatServer::bind(&config, state).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
