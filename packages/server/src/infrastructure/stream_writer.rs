//! Per-recipient writer task.
//!
//! Each admitted connection gets a bounded queue and one task that owns the
//! socket's write half. Broadcasts only enqueue, so a peer that stops
//! reading fills its own queue instead of stalling everyone else's fan-out.
//!
//! The task ends in one of three ways:
//! - every sender is dropped: what is queued is flushed, then the write half
//!   is shut down
//! - a write fails: the write half is shut down
//! - the sender is cancelled: the task stops at once, even in the middle of
//!   a write the peer is not reading, and the write half is dropped
//!
//! In all three cases the receiver is closed, so later enqueues fail fast.

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// Smallest queue able to hold the welcome line and the replay batch.
const MIN_OUTBOUND_CAPACITY: usize = 2;

/// One unit of work for the writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A single write
    Line(String),
    /// Several writes that must stay contiguous (history replay)
    Batch(Vec<String>),
}

/// Enqueueing side of a recipient's outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    frames: mpsc::Sender<Frame>,
    cancel: CancellationToken,
}

impl OutboundSender {
    pub fn try_send(&self, frame: Frame) -> Result<(), TrySendError<Frame>> {
        self.frames.try_send(frame)
    }

    /// Stop the writer task without waiting for pending writes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token the writer task watches; hand it to [`spawn_stream_writer`].
    pub fn writer_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.frames.is_closed()
    }

    pub fn max_capacity(&self) -> usize {
        self.frames.max_capacity()
    }
}

/// Create a recipient's outbound queue.
pub fn outbound_channel(capacity: usize) -> (OutboundSender, mpsc::Receiver<Frame>) {
    let (frames, receiver) = mpsc::channel(capacity.max(MIN_OUTBOUND_CAPACITY));
    let sender = OutboundSender {
        frames,
        cancel: CancellationToken::new(),
    };
    (sender, receiver)
}

/// Spawn the task draining `receiver` into `writer` until it ends or `cancel` fires.
pub fn spawn_stream_writer<W>(
    writer: W,
    receiver: mpsc::Receiver<Frame>,
    cancel: CancellationToken,
    peer: String,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(run_stream_writer(writer, receiver, cancel, peer))
}

enum WriterExit {
    Drained,
    Failed(std::io::Error),
    Cancelled,
}

async fn run_stream_writer<W>(
    mut writer: W,
    mut receiver: mpsc::Receiver<Frame>,
    cancel: CancellationToken,
    peer: String,
) where
    W: AsyncWrite + Unpin,
{
    let exit = tokio::select! {
        biased;
        _ = cancel.cancelled() => WriterExit::Cancelled,
        result = drain(&mut writer, &mut receiver) => match result {
            Ok(()) => WriterExit::Drained,
            Err(e) => WriterExit::Failed(e),
        },
    };
    receiver.close();

    match exit {
        WriterExit::Cancelled => {
            // shutdown may itself wait on a peer that is not reading
            tracing::debug!("Writer for {} cancelled", peer);
            return;
        }
        WriterExit::Drained => tracing::debug!("Outbound queue for {} closed", peer),
        WriterExit::Failed(e) => tracing::warn!("Error writing to {}: {}", peer, e),
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Failed to shut down write half of {}: {}", peer, e);
    }
}

async fn drain<W>(writer: &mut W, receiver: &mut mpsc::Receiver<Frame>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = receiver.recv().await {
        match frame {
            Frame::Line(text) => writer.write_all(text.as_bytes()).await?,
            Frame::Batch(lines) => {
                for line in lines {
                    writer.write_all(line.as_bytes()).await?;
                }
            }
        }
        writer.flush().await?;
    }
    Ok(())
}
