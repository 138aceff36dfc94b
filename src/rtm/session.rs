//! Connected real-time session: duplex frame traffic over one socket.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::rtm::client::RtmError;
use crate::rtm::proto::{InboundFrame, OutboundMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connected real-time session.
///
/// Holds both halves of the session socket. Sending and receiving are
/// independent: one task can sit in [`receive`](Self::receive) while others
/// call [`send`](Self::send). All methods take `&self`, so multi-task use is
/// a matter of sharing the session behind an [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct RtmSession {
    ids: RequestIdAllocator,
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl RtmSession {
    pub(crate) fn from_socket(socket: WsStream) -> Self {
        let (writer, reader) = socket.split();
        Self {
            ids: RequestIdAllocator::new(),
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        }
    }

    /// Sends one outbound message, stamping it with a fresh request id.
    ///
    /// The message's id field is overwritten; whatever it held is ignored.
    /// Returns the id that went out on the wire so the caller can match a
    /// later ack's `reply_to` against it.
    pub async fn send(&self, message: &mut OutboundMessage) -> Result<u64, RtmError> {
        message.id = self.ids.next();
        let text = message.to_text().map_err(RtmError::Encode)?;

        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(text)).await?;
        Ok(message.id)
    }

    /// Receives the next inbound protocol frame.
    ///
    /// Control frames are handled internally and never surfaced. Once the
    /// peer has closed the socket, or [`close`](Self::close) has shut it
    /// down locally, this returns [`RtmError::ConnectionClosed`].
    pub async fn receive(&self) -> Result<InboundFrame, RtmError> {
        let mut reader = self.reader.lock().await;
        loop {
            let frame = match reader.next().await {
                Some(frame) => frame?,
                None => return Err(RtmError::ConnectionClosed),
            };

            match frame {
                Message::Text(text) => {
                    return InboundFrame::from_text(&text).map_err(|source| RtmError::Decode {
                        context: "inbound rtm frame",
                        source,
                    });
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => return Err(RtmError::ConnectionClosed),
                Message::Binary(_) | Message::Frame(_) => return Err(RtmError::NonTextFrame),
            }
        }
    }

    /// Closes the session socket.
    ///
    /// Initiates the closing handshake on the write half; a receive blocked
    /// on the read half observes the shutdown and returns
    /// [`RtmError::ConnectionClosed`]. Closing an already-closed session is
    /// a no-op. The session cannot be used again afterwards.
    pub async fn close(&self) -> Result<(), RtmError> {
        let mut writer = self.writer.lock().await;
        match writer.close().await {
            Ok(()) => {
                debug!(event = "rtm_session_closed");
                Ok(())
            }
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Monotonic allocator for outbound request ids.
///
/// Ids start at 1 and stay unique for the lifetime of the session that owns
/// the allocator. Every session gets a fresh allocator, so a replacement
/// session starts the sequence over at 1.
#[derive(Debug, Default)]
pub struct RequestIdAllocator {
    next: AtomicU64,
}

impl RequestIdAllocator {
    /// Creates an allocator whose first issued id is 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Issues the next id.
    pub fn next(&self) -> u64 {
        // Relaxed is enough: nothing else is ordered against the counter.
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}
