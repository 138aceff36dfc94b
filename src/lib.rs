//! Rust SDK for the Banter real-time messaging platform.
//!
//! The crate is organized by transport surface:
//! - `rtm`: discovery handshake, persistent websocket session, frame codec,
//!   and ack correlation.
//! - `web_api`: stateless HTTP lookups against the directory endpoints.

/// Realtime session client, protocol frames, and ack routing.
pub mod rtm;
/// Channel and user lookup client and schemas.
pub mod web_api;
