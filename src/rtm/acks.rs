//! Request/ack correlation on top of a session's duplex frame traffic.
//!
//! The session itself only stamps ids and moves frames. When a caller wants
//! to pair a send with the ack that answers it, an [`AckRouter`] tracks the
//! outstanding ids and hands each inbound ack to the task that is waiting
//! on it. One task drives [`RtmSession::receive`] and feeds every frame
//! through [`AckRouter::route`]; senders go through
//! [`AckRouter::send_tracked`] and park on the returned [`AckHandle`].

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex};

use crate::rtm::client::RtmError;
use crate::rtm::proto::{InboundFrame, MessageAck, OutboundMessage};
use crate::rtm::session::RtmSession;

/// Routes inbound acks to the tasks waiting on their request ids.
#[derive(Debug, Default)]
pub struct AckRouter {
    pending: Mutex<HashMap<u64, oneshot::Sender<MessageAck>>>,
}

impl AckRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends a message through the session and registers a waiter for its
    /// ack.
    ///
    /// The pending map lock is held across the send so an ack racing back
    /// cannot be routed before its waiter is registered.
    pub async fn send_tracked(
        &self,
        session: &RtmSession,
        message: &mut OutboundMessage,
    ) -> Result<AckHandle, RtmError> {
        let mut pending = self.pending.lock().await;
        let id = session.send(message).await?;

        let (tx, rx) = oneshot::channel();
        pending.insert(id, tx);
        Ok(AckHandle { id, rx })
    }

    /// Routes one inbound frame.
    ///
    /// Acks whose `reply_to` has a registered waiter are consumed and
    /// delivered to that waiter. Everything else, events and untracked acks
    /// alike, is handed back for the read loop to interpret.
    pub async fn route(&self, frame: InboundFrame) -> Option<InboundFrame> {
        let ack = match frame {
            InboundFrame::Ack(ack) => ack,
            other => return Some(other),
        };

        let tx = self.pending.lock().await.remove(&ack.reply_to);
        match tx {
            Some(tx) => {
                // A dropped handle means nobody cares about this ack anymore.
                let _ = tx.send(ack);
                None
            }
            None => Some(InboundFrame::Ack(ack)),
        }
    }

    /// Drops every registered waiter.
    ///
    /// Pending [`AckHandle::wait`] calls resolve to
    /// [`RtmError::ConnectionClosed`]. Called when the read loop stops
    /// because the session is gone.
    pub async fn abort_all(&self) {
        self.pending.lock().await.clear();
    }
}

/// A claim ticket for one in-flight request.
#[derive(Debug)]
pub struct AckHandle {
    id: u64,
    rx: oneshot::Receiver<MessageAck>,
}

impl AckHandle {
    /// The request id the awaited ack will carry in `reply_to`.
    pub fn request_id(&self) -> u64 {
        self.id
    }

    /// Waits for the ack answering this request.
    pub async fn wait(self) -> Result<MessageAck, RtmError> {
        self.rx.await.map_err(|_| RtmError::ConnectionClosed)
    }
}
