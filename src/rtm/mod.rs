//! Real-time messaging modules.
//!
//! - `client`: discovery handshake and session socket dial.
//! - `proto`: wire frames shared with the real-time service.
//! - `session`: connected duplex session with request id stamping.
//! - `acks`: optional request/ack correlation for concurrent senders.

/// Request/ack correlation helpers.
pub mod acks;
/// Discovery handshake and websocket dial.
pub mod client;
/// Real-time protocol frames.
pub mod proto;
/// Connected session and request id allocation.
pub mod session;
