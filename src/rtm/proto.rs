use serde::{Deserialize, Serialize};

/// Outbound real-time frame sent over the session socket.
///
/// `id` is assigned by the session at send time; any caller-set value is
/// overwritten before the frame goes on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl OutboundMessage {
    /// Builds a chat message frame addressed to a channel.
    pub fn chat(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: "message".to_string(),
            channel: channel.into(),
            text: text.into(),
            user: None,
        }
    }

    /// Sets the user reference carried by the frame.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Acknowledgement of a previously sent frame, correlated by `reply_to`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageAck {
    pub ok: bool,
    /// Identifier of the outbound request this ack answers.
    pub reply_to: u64,
    /// Server timestamp, e.g. `"1355517523.000005"`. Empty when omitted.
    #[serde(default)]
    pub ts: String,
    /// Possibly server-modified copy of the request text.
    #[serde(default)]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AckError>,
}

impl MessageAck {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Structured error carried by a failed [`MessageAck`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckError {
    pub code: i32,
    pub msg: String,
}

/// Server-initiated event notification. Events carry no identifier
/// semantics; correlation applies to acks only.
///
/// Only the fields this SDK consumes are modeled. Unknown fields are
/// ignored so newer server payloads keep decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl EventFrame {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One decoded inbound frame: an ack for an outbound request, or an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Ack(MessageAck),
    Event(EventFrame),
}

impl InboundFrame {
    /// Decodes an inbound frame, trying the more specific ack schema first.
    ///
    /// An ack is recognized by its required `ok` and `reply_to` fields;
    /// anything else must carry a `type` tag to decode as an event.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        if let Ok(ack) = serde_json::from_str::<MessageAck>(text) {
            return Ok(Self::Ack(ack));
        }
        serde_json::from_str::<EventFrame>(text).map(Self::Event)
    }
}
