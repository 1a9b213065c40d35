//! Connection Registry
//!
//! The set of active recipients, capacity-bounded and unique by name.
//! Admission, removal and snapshots all serialize on one lock; nothing slow
//! (socket writes, closing) happens while it is held.

use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::domain::{
    AdmissionError, ConnectionId, DeliveryError, DisplayName, HistoryStore, Message, Sequence,
};

use super::stream_writer::{Frame, OutboundSender};

/// Outcome of a successful live delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the recipient's writer
    Sent,
    /// Skipped: the message is (or will be) part of the recipient's replay
    CoveredByReplay,
}

/// One active participant and the write side of its connection.
pub struct Recipient {
    id: ConnectionId,
    name: DisplayName,
    outbound: Mutex<Outbound>,
    closed: Notify,
}

struct Outbound {
    /// `None` once the registry has closed the connection
    sender: Option<OutboundSender>,
    /// First sequence not covered by the replay; `None` until replayed
    live_from: Option<Sequence>,
}

impl Recipient {
    fn new(name: DisplayName, sender: OutboundSender) -> Self {
        Self {
            id: ConnectionId::generate(),
            name,
            outbound: Mutex::new(Outbound {
                sender: Some(sender),
                live_from: None,
            }),
            closed: Notify::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Queue text for this recipient only, outside of history.
    pub async fn send_direct(&self, text: String) -> Result<(), DeliveryError> {
        let outbound = self.outbound.lock().await;
        push(&outbound, Frame::Line(text))
    }

    /// Queue the history replay and switch the recipient to live delivery.
    ///
    /// The outbound lock is held across the history snapshot, so a live
    /// broadcast either lands after the replay or is already in it. Live
    /// messages arriving before this call are dropped because their append
    /// happened first and the snapshot contains them.
    ///
    /// Returns the number of replayed messages.
    pub async fn replay(&self, history: &dyn HistoryStore) -> Result<usize, DeliveryError> {
        let mut outbound = self.outbound.lock().await;
        let snapshot = history.snapshot().await;
        outbound.live_from = Some(snapshot.next_sequence);

        let lines = snapshot.replay_lines();
        if !lines.is_empty() {
            push(&outbound, Frame::Batch(lines))?;
        }
        Ok(snapshot.entries.len())
    }

    /// Queue a broadcast message appended to history at `sequence`.
    pub async fn deliver(
        &self,
        sequence: Sequence,
        message: &Message,
    ) -> Result<Delivery, DeliveryError> {
        let outbound = self.outbound.lock().await;
        match outbound.live_from {
            Some(live_from) if sequence >= live_from => {
                push(&outbound, Frame::Line(message.as_str().to_string()))?;
                Ok(Delivery::Sent)
            }
            _ => Ok(Delivery::CoveredByReplay),
        }
    }

    /// Resolves once the registry has closed this recipient's connection.
    pub async fn closed(&self) {
        self.closed.notified().await
    }

    /// Stop the writer task and release the write half.
    ///
    /// Frames still queued are discarded. Returns `false` if it was already
    /// closed.
    async fn close(&self) -> bool {
        let sender = self.outbound.lock().await.sender.take();
        if let Some(sender) = &sender {
            sender.cancel();
        }
        self.closed.notify_one();
        sender.is_some()
    }
}

fn push(outbound: &Outbound, frame: Frame) -> Result<(), DeliveryError> {
    use tokio::sync::mpsc::error::TrySendError;

    let sender = outbound.sender.as_ref().ok_or(DeliveryError::Closed)?;
    sender.try_send(frame).map_err(|e| match e {
        TrySendError::Full(_) => DeliveryError::Backlogged,
        TrySendError::Closed(_) => DeliveryError::Closed,
    })
}

/// Registry of active recipients, in admission order.
pub struct ConnectionRegistry {
    recipients: Mutex<Vec<Arc<Recipient>>>,
    capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            recipients: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Atomically check the name and the capacity, then register.
    ///
    /// # Errors
    ///
    /// * `AdmissionError::DuplicateName` - an active recipient has the same name, ignoring case
    /// * `AdmissionError::Full` - the registry is at capacity
    pub async fn try_admit(
        &self,
        name: DisplayName,
        sender: OutboundSender,
    ) -> Result<Arc<Recipient>, AdmissionError> {
        let mut recipients = self.recipients.lock().await;

        if recipients.iter().any(|r| r.name.matches(&name)) {
            return Err(AdmissionError::DuplicateName(name.as_str().to_string()));
        }
        if recipients.len() >= self.capacity {
            return Err(AdmissionError::Full);
        }

        let recipient = Arc::new(Recipient::new(name, sender));
        recipients.push(recipient.clone());
        tracing::debug!(
            "Recipient '{}' ({}) registered, {}/{} seats taken",
            recipient.name,
            recipient.id,
            recipients.len(),
            self.capacity
        );
        Ok(recipient)
    }

    /// Unregister a recipient and close its connection.
    ///
    /// Idempotent. The close happens after the registry lock is released.
    /// Returns whether the recipient was registered.
    pub async fn remove(&self, recipient: &Recipient) -> bool {
        let removed = {
            let mut recipients = self.recipients.lock().await;
            match recipients.iter().position(|r| r.id == recipient.id) {
                Some(index) => {
                    recipients.remove(index);
                    true
                }
                None => false,
            }
        };

        recipient.close().await;
        if removed {
            tracing::debug!("Recipient '{}' ({}) unregistered", recipient.name, recipient.id);
        }
        removed
    }

    /// Point-in-time copy of the roster, safe to iterate without the lock.
    pub async fn snapshot(&self) -> Vec<Arc<Recipient>> {
        self.recipients.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.recipients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Advisory capacity check; `try_admit` is the authoritative one.
    pub async fn is_full(&self) -> bool {
        self.len().await >= self.capacity
    }
}
