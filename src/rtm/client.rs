//! Real-time session establishment: discovery handshake and socket dial.
//!
//! The client exchanges the long-lived credential for a one-time session
//! socket URL, then dials that URL with the sub-protocol and origin the
//! service expects.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, ORIGIN, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::debug;

use crate::rtm::session::RtmSession;

const ERROR_BODY_SNIPPET_LEN: usize = 220;
const RTM_START_PATH: &str = "/v1/rtm/start";

/// Production API base used for the discovery handshake.
pub const API_BASE_URL: &str = "https://api.banter.chat";
/// Local development API base.
pub const LOCAL_API_BASE_URL: &str = "http://localhost:8080";
/// Origin header presented when dialing the session socket.
pub const RTM_ORIGIN: &str = "https://api.banter.chat";
/// Sub-protocol token declared on the session socket.
pub const RTM_SUBPROTOCOL: &str = "banter-rtm-v1";

/// Entry point for establishing real-time sessions.
///
/// The client is the unconnected half of the session lifecycle: it carries
/// the credential and produces one connected [`RtmSession`] per successful
/// handshake. A failed [`connect`](RtmClient::connect) constructs nothing,
/// so the client can simply be asked for a fresh session.
#[derive(Clone)]
pub struct RtmClient {
    token: SecretString,
    http: Client,
    local: bool,
    api_base_override: Option<String>,
}

impl RtmClient {
    /// Creates a client for the production endpoints.
    pub fn new(token: SecretString) -> Result<Self, RtmError> {
        let http = Client::builder().build().map_err(RtmError::Transport)?;
        Ok(Self {
            token,
            http,
            local: false,
            api_base_override: None,
        })
    }

    /// Enables or disables local mode endpoint routing.
    pub fn with_local_mode(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Sets an explicit API base override for the discovery handshake.
    ///
    /// The override takes precedence over local mode when set.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base_override = Some(base.trim_end().trim_end_matches('/').to_string());
        self
    }

    /// Performs the discovery handshake and dials the returned endpoint.
    ///
    /// On success the session is connected and ready for
    /// [`send`](RtmSession::send)/[`receive`](RtmSession::receive). On any
    /// failure the error is returned and no session exists; the handshake
    /// must be restarted from scratch for the next attempt.
    pub async fn connect(&self) -> Result<RtmSession, RtmError> {
        let endpoint = self.discover().await?;
        self.dial(endpoint).await
    }

    /// Exchanges the credential for a one-time session endpoint.
    ///
    /// One round trip against `/v1/rtm/start`; failures are surfaced
    /// verbatim with no retry.
    pub async fn discover(&self) -> Result<SessionEndpoint, RtmError> {
        let endpoint = format!("{}{}", self.api_base(), RTM_START_PATH);
        let response = self
            .http
            .get(&endpoint)
            .query(&[("token", self.token.expose_secret())])
            .send()
            .await
            .map_err(RtmError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(RtmError::Transport)?;

        if !status.is_success() {
            return Err(RtmError::HttpStatus {
                status,
                body: summarize_body(&body),
            });
        }

        parse_start_response(&body)
    }

    /// Dials the session socket at a previously discovered endpoint.
    ///
    /// Consumes the endpoint: the service hands them out for exactly one
    /// connection attempt.
    pub async fn dial(&self, endpoint: SessionEndpoint) -> Result<RtmSession, RtmError> {
        let mut request = endpoint.url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(ORIGIN, HeaderValue::from_static(RTM_ORIGIN));
        headers.insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(RTM_SUBPROTOCOL));

        let (socket, _) = connect_async(request).await?;
        debug!(event = "rtm_session_connected");
        Ok(RtmSession::from_socket(socket))
    }

    fn api_base(&self) -> &str {
        if let Some(base) = self.api_base_override.as_deref() {
            return base;
        }
        if self.local {
            LOCAL_API_BASE_URL
        } else {
            API_BASE_URL
        }
    }
}

/// One-time session socket URL returned by the discovery handshake.
///
/// Deliberately not `Clone`: dialing consumes the endpoint, and the service
/// does not honor a second dial of the same URL.
#[derive(Debug)]
pub struct SessionEndpoint {
    url: String,
}

impl SessionEndpoint {
    /// The socket URL to dial.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    ok: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    error: String,
}

fn parse_start_response(body: &str) -> Result<SessionEndpoint, RtmError> {
    let start: StartResponse = serde_json::from_str(body).map_err(|source| RtmError::Decode {
        context: "rtm start response",
        source,
    })?;

    if !start.ok {
        return Err(RtmError::Rejected(start.error));
    }

    Ok(SessionEndpoint { url: start.url })
}

fn summarize_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_SNIPPET_LEN).collect()
}

/// Errors produced by the discovery handshake, the session socket, and the
/// frame codec.
#[derive(Debug, Error)]
pub enum RtmError {
    /// Discovery request could not be sent or its body could not be read.
    #[error("rtm start request failed: {0}")]
    Transport(reqwest::Error),

    /// Discovery endpoint answered with a non-success status.
    #[error("rtm start http status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    /// Discovery envelope was well-formed and explicitly not ok.
    #[error("rtm start rejected by server: {0}")]
    Rejected(String),

    /// WebSocket failure while dialing, reading, or writing.
    #[error("websocket error: {0}")]
    WebSocket(#[from] WsError),

    /// The connection ended: closed by the peer, or locally via `close`.
    #[error("rtm connection closed")]
    ConnectionClosed,

    /// An outbound frame could not be serialized.
    #[error("failed to encode outbound frame: {0}")]
    Encode(serde_json::Error),

    /// A payload did not match the expected schema.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The peer sent a non-text data frame; the protocol is text-only.
    #[error("received unexpected non-text websocket frame")]
    NonTextFrame,
}

impl RtmError {
    /// True for network/socket-level failures at any stage.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::HttpStatus { .. }
                | Self::WebSocket(_)
                | Self::ConnectionClosed
        )
    }

    /// True for malformed or schema-mismatched payloads.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Encode(_) | Self::Decode { .. } | Self::NonTextFrame
        )
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use secrecy::SecretString;

    use super::{
        parse_start_response, RtmClient, RtmError, API_BASE_URL, LOCAL_API_BASE_URL,
    };

    fn client() -> RtmClient {
        RtmClient::new(SecretString::new("test-token".to_string())).expect("build client")
    }

    #[test]
    fn rtm_client_uses_production_base_by_default() {
        assert_eq!(client().api_base(), API_BASE_URL);
    }

    #[test]
    fn rtm_client_uses_local_base_when_enabled() {
        assert_eq!(client().with_local_mode(true).api_base(), LOCAL_API_BASE_URL);
    }

    #[test]
    fn rtm_client_api_base_override_takes_precedence() {
        let client = client()
            .with_local_mode(true)
            .with_api_base("http://127.0.0.1:9099/   \n");
        assert_eq!(client.api_base(), "http://127.0.0.1:9099");
    }

    #[test]
    fn parse_start_ok_envelope_returns_endpoint() {
        let endpoint = parse_start_response(r#"{"ok":true,"url":"wss://rtm.banter.chat/s/abc"}"#)
            .expect("parse ok envelope");
        assert_eq!(endpoint.url(), "wss://rtm.banter.chat/s/abc");
    }

    #[test]
    fn parse_start_rejection_carries_server_error() {
        let error = parse_start_response(r#"{"ok":false,"error":"invalid_auth"}"#)
            .expect_err("not-ok envelope should fail");
        match &error {
            RtmError::Rejected(reason) => assert_eq!(reason, "invalid_auth"),
            other => panic!("unexpected error variant: {other:?}"),
        }
        assert!(!error.is_transport());
        assert!(!error.is_decode());
    }

    #[test]
    fn parse_start_garbage_is_decode_error() {
        let error = parse_start_response("<html>busy</html>").expect_err("garbage should fail");
        assert!(error.is_decode());
        assert!(matches!(error, RtmError::Decode { .. }));
    }

    #[test]
    fn http_status_classifies_as_transport() {
        let error = RtmError::HttpStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "busy".to_string(),
        };
        assert!(error.is_transport());
        assert!(!error.is_decode());
    }
}
