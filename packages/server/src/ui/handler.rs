//! Per-connection session.
//!
//! `Negotiating-Name → Active → Terminated`. The read half stays with this
//! task; the write half goes to the recipient's writer task once admitted.
//!
//! Lines are capped in length and decoded lossily, so any byte sequence a
//! netcat client sends is relayed rather than ending the session.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{
    domain::{AdmissionError, BANNER, DisplayName, NAME_PROMPT},
    infrastructure::{Recipient, outbound_channel, spawn_stream_writer},
    usecase::{Departure, SendMessageUseCase},
};

use super::state::AppState;

#[derive(Debug, Error)]
enum HandshakeError {
    #[error("no name received within {0:?}")]
    TimedOut(Duration),

    #[error("connection closed before a name was sent")]
    Disconnected,

    #[error("name line longer than {0} bytes")]
    NameTooLong(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rejected(#[from] AdmissionError),
}

/// One read from the client.
#[derive(Debug, PartialEq, Eq)]
enum ReadLine {
    /// A line without its terminator; the last one may lack a newline
    Line(String),
    Eof,
    /// More than the limit arrived without a newline
    TooLong,
}

/// Read one `\n`-terminated line of at most `limit` bytes.
///
/// Invalid UTF-8 is replaced rather than rejected.
async fn read_line<R>(reader: &mut BufReader<R>, limit: usize) -> std::io::Result<ReadLine>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(ReadLine::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > limit {
        return Ok(ReadLine::TooLong);
    }
    Ok(ReadLine::Line(String::from_utf8_lossy(&buf).into_owned()))
}

/// Drive one accepted connection until it leaves the chat.
///
/// # Arguments
///
/// * `reader` - Read half of the connection
/// * `writer` - Write half of the connection
/// * `peer` - Remote address, for logs
/// * `state` - Shared server state
pub async fn handle_connection<R, W>(reader: R, mut writer: W, peer: String, state: Arc<AppState>)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(reader);

    let name = match negotiate_name(&mut reader, &mut writer, &state).await {
        Ok(name) => name,
        Err(e) => {
            tracing::info!("Handshake with {} failed: {}", peer, e);
            reject(writer, &e, &peer).await;
            return;
        }
    };

    let (sender, receiver) = outbound_channel(state.outbound_queue_capacity);
    let writer_token = sender.writer_token();
    let recipient = match state.join_chat_usecase.execute(name, sender).await {
        Ok(recipient) => recipient,
        Err(e) => {
            tracing::warn!("Rejecting {}: {}", peer, e);
            reject(writer, &HandshakeError::Rejected(e), &peer).await;
            return;
        }
    };
    spawn_stream_writer(writer, receiver, writer_token, peer);

    let departure = relay_lines(
        &mut reader,
        &recipient,
        &state.send_message_usecase,
        state.max_line_length,
    )
    .await;
    state.leave_chat_usecase.execute(&recipient, departure).await;
}

/// Send the banner and prompt, then read one line as the name.
///
/// The deadline covers the whole exchange.
async fn negotiate_name<R, W>(
    reader: &mut BufReader<R>,
    writer: &mut W,
    state: &AppState,
) -> Result<DisplayName, HandshakeError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let handshake = async {
        writer.write_all(BANNER.as_bytes()).await?;
        writer.write_all(NAME_PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let name = match read_line(reader, state.max_name_length).await? {
            ReadLine::Line(line) => DisplayName::new(&line)?,
            ReadLine::Eof => return Err(HandshakeError::Disconnected),
            ReadLine::TooLong => {
                return Err(HandshakeError::NameTooLong(state.max_name_length));
            }
        };
        Ok::<_, HandshakeError>(name)
    };

    tokio::time::timeout(state.name_timeout, handshake)
        .await
        .map_err(|_| HandshakeError::TimedOut(state.name_timeout))?
}

/// Tell the client why (when there is a fixed notice for it) and close.
async fn reject<W>(mut writer: W, error: &HandshakeError, peer: &str)
where
    W: AsyncWrite + Unpin,
{
    if let HandshakeError::Rejected(admission) = error
        && let Err(e) = writer.write_all(admission.client_notice().as_bytes()).await
    {
        tracing::debug!("Failed to send rejection to {}: {}", peer, e);
    }
    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Failed to close connection to {}: {}", peer, e);
    }
}

/// Broadcast every line the participant sends until the session ends.
async fn relay_lines<R>(
    reader: &mut BufReader<R>,
    recipient: &Recipient,
    send_message: &SendMessageUseCase,
    max_line_length: usize,
) -> Departure
where
    R: AsyncRead + Unpin,
{
    loop {
        tokio::select! {
            _ = recipient.closed() => return Departure::Evicted,
            line = read_line(reader, max_line_length) => match line {
                Ok(ReadLine::Line(line)) => {
                    let body = line.trim();
                    if body.is_empty() {
                        tracing::info!("'{}' sent an empty line, ending the session", recipient.name());
                        return Departure::EmptyLine;
                    }
                    send_message.execute(recipient, body).await;
                }
                Ok(ReadLine::Eof) => return Departure::Closed,
                Ok(ReadLine::TooLong) => {
                    tracing::warn!(
                        "'{}' sent a line longer than {} bytes, ending the session",
                        recipient.name(),
                        max_line_length
                    );
                    return Departure::LineTooLong;
                }
                Err(e) => {
                    tracing::warn!("Error reading from '{}': {}", recipient.name(), e);
                    return Departure::ReadError;
                }
            },
        }
    }
}
