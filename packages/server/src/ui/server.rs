//! Server execution logic.

use std::{future::Future, io, net::SocketAddr, sync::Arc};

use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};

use crate::{config::ServerConfig, domain::CHAT_FULL_NOTICE};

use super::{handler::handle_connection, signal::shutdown_signal, state::AppState};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read the listening address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// TCP chat server
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::from_config(&config, Arc::new(SystemClock)));
/// let server = ChatServer::bind(&config, state).await?;
/// server.run().await?;
/// ```
pub struct ChatServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl ChatServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(config: &ServerConfig, state: Arc<AppState>) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Accept connections until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection gets its own task right away, so accepting never
    /// waits on per-connection work. Accept errors are logged and skipped.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let local_addr = self.local_addr()?;
        tracing::info!("Listening on the port :{}", local_addr.port());
        tracing::info!("Connect with: nc localhost {}", local_addr.port());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!("Accepted connection from {}", peer);
                        tokio::spawn(serve_connection(stream, peer, self.state.clone()));
                    }
                    Err(e) => tracing::warn!("Error accepting connection: {}", e),
                },
            }
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Advisory capacity check, then hand the stream to the session handler.
async fn serve_connection(mut stream: TcpStream, peer: SocketAddr, state: Arc<AppState>) {
    if state.registry.is_full().await {
        tracing::warn!("Rejecting {}: chat is full", peer);
        if let Err(e) = stream.write_all(CHAT_FULL_NOTICE.as_bytes()).await {
            tracing::debug!("Failed to send chat-full notice to {}: {}", peer, e);
        }
        if let Err(e) = stream.shutdown().await {
            tracing::debug!("Failed to close connection to {}: {}", peer, e);
        }
        return;
    }

    let (reader, writer) = stream.into_split();
    handle_connection(reader, writer, peer.to_string(), state).await;
}
