use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const ERROR_BODY_SNIPPET_LEN: usize = 220;
pub const WEB_API_BASE_URL: &str = "https://api.banter.chat";
pub const LOCAL_WEB_API_BASE_URL: &str = "http://localhost:8080";

/// Stateless client for the directory lookup endpoints.
///
/// Every call is a single authenticated GET; nothing is cached and no
/// session state is carried between calls.
#[derive(Clone)]
pub struct WebApiClient {
    http: Client,
    token: SecretString,
    local: bool,
    api_base_override: Option<String>,
}

impl WebApiClient {
    pub fn new(token: SecretString) -> Result<Self, WebApiError> {
        let http = Client::builder().build().map_err(WebApiError::Transport)?;
        Ok(Self {
            http,
            token,
            local: false,
            api_base_override: None,
        })
    }

    pub fn with_local_mode(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Sets an explicit API base override; takes precedence over local mode.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base_override = Some(base.trim_end().trim_end_matches('/').to_string());
        self
    }

    /// Looks up one channel by id.
    ///
    /// Direct-message ids are rejected before any request goes out; they
    /// name conversations, not channels, and the endpoint would answer with
    /// an opaque `channel_not_found`.
    pub async fn channel_info(&self, channel_id: &str) -> Result<Channel, WebApiError> {
        if is_direct_message_channel(channel_id) {
            return Err(WebApiError::DirectMessage(channel_id.to_string()));
        }

        let body = self
            .fetch("/v1/channels/info", &[("channel", channel_id)])
            .await?;
        parse_channel_response(&body)
    }

    /// Looks up one user by id.
    pub async fn user_info(&self, user_id: &str) -> Result<User, WebApiError> {
        let body = self.fetch("/v1/users/info", &[("user", user_id)]).await?;
        parse_user_response(&body)
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<String, WebApiError> {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .get(&endpoint)
            .query(&[("token", self.token.expose_secret().as_str())])
            .query(params)
            .send()
            .await
            .map_err(WebApiError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(WebApiError::Transport)?;

        if !status.is_success() {
            return Err(WebApiError::HttpStatus {
                status,
                body: summarize_error_body(&body),
            });
        }

        Ok(body)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn base_url(&self) -> &str {
        if let Some(base) = self.api_base_override.as_deref() {
            return base;
        }
        if self.local {
            LOCAL_WEB_API_BASE_URL
        } else {
            WEB_API_BASE_URL
        }
    }
}

/// True when the id names a direct-message conversation rather than a
/// channel.
pub fn is_direct_message_channel(id: &str) -> bool {
    id.starts_with('D')
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub is_channel: bool,
    pub created: i64,
    pub creator: String,
    pub is_archived: bool,
    pub is_general: bool,
    pub members: Vec<String>,
    pub is_member: bool,
    pub last_read: String,
    pub unread_count: i64,
    pub unread_count_display: i64,
    pub topic: ChannelTopic,
    pub purpose: ChannelTopic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelTopic {
    pub value: String,
    pub creator: String,
    pub last_set: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub deleted: bool,
    pub color: String,
    pub profile: UserProfile,
    pub is_admin: bool,
    pub is_owner: bool,
    pub has_2fa: bool,
    pub has_files: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub real_name: String,
    pub email: String,
    pub skype: String,
    pub phone: String,
    pub image_24: String,
    pub image_32: String,
    pub image_48: String,
    pub image_72: String,
    pub image_192: String,
}

#[derive(Debug, Error)]
pub enum WebApiError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("http status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("lookup rejected by server: {0}")]
    Rejected(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("{0} is a direct message id, not a channel id")]
    DirectMessage(String),
}

#[derive(Debug, Deserialize)]
struct ChannelEnvelope {
    ok: bool,
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    ok: bool,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    error: String,
}

fn parse_channel_response(body: &str) -> Result<Channel, WebApiError> {
    let envelope: ChannelEnvelope =
        serde_json::from_str(body).map_err(|err| WebApiError::Parse(err.to_string()))?;

    if !envelope.ok {
        return Err(WebApiError::Rejected(envelope.error));
    }

    envelope
        .channel
        .ok_or_else(|| WebApiError::Parse("ok response missing channel payload".to_string()))
}

fn parse_user_response(body: &str) -> Result<User, WebApiError> {
    let envelope: UserEnvelope =
        serde_json::from_str(body).map_err(|err| WebApiError::Parse(err.to_string()))?;

    if !envelope.ok {
        return Err(WebApiError::Rejected(envelope.error));
    }

    envelope
        .user
        .ok_or_else(|| WebApiError::Parse("ok response missing user payload".to_string()))
}

fn summarize_error_body(body: &str) -> String {
    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error.or(parsed.message) {
            return message;
        }
    }

    body.chars().take(ERROR_BODY_SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{
        is_direct_message_channel, parse_channel_response, parse_user_response,
        summarize_error_body, UserProfile, WebApiClient, WebApiError, LOCAL_WEB_API_BASE_URL,
        WEB_API_BASE_URL,
    };

    fn client() -> WebApiClient {
        WebApiClient::new(SecretString::new("test-token".to_string())).expect("build client")
    }

    #[test]
    fn parse_channel_ok_envelope() {
        let payload = r#"{
            "ok": true,
            "channel": {
                "id": "C024BE91L",
                "name": "fun",
                "is_channel": true,
                "created": 1360782804,
                "creator": "U024BE7LH",
                "members": ["U024BE7LH", "U023BECGF"],
                "is_member": true,
                "topic": {"value": "Fun times", "creator": "U024BE7LV", "last_set": 1369677212},
                "purpose": {"value": "This channel is for fun", "creator": "", "last_set": 0},
                "unread_count": 3
            }
        }"#;

        let channel = parse_channel_response(payload).expect("parse channel envelope");
        assert_eq!(channel.id, "C024BE91L");
        assert_eq!(channel.name, "fun");
        assert!(channel.is_channel);
        assert_eq!(channel.members.len(), 2);
        assert_eq!(channel.topic.value, "Fun times");
        assert_eq!(channel.unread_count, 3);
        assert_eq!(channel.unread_count_display, 0);
        assert!(channel.latest.is_none());
    }

    #[test]
    fn parse_channel_not_ok_envelope_is_rejected() {
        let error = parse_channel_response(r#"{"ok":false,"error":"channel_not_found"}"#)
            .expect_err("not-ok envelope should fail");
        match error {
            WebApiError::Rejected(reason) => assert_eq!(reason, "channel_not_found"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn parse_channel_ok_without_payload_is_parse_error() {
        let error = parse_channel_response(r#"{"ok":true}"#)
            .expect_err("missing channel payload should fail");
        assert!(matches!(error, WebApiError::Parse(_)));
    }

    #[test]
    fn parse_user_defaults_missing_fields() {
        let payload = r#"{"ok":true,"user":{"id":"U023BECGF","name":"bobby","has_2fa":true}}"#;
        let user = parse_user_response(payload).expect("parse user envelope");

        assert_eq!(user.id, "U023BECGF");
        assert_eq!(user.name, "bobby");
        assert!(user.has_2fa);
        assert_eq!(user.team_id, "");
        assert_eq!(user.profile, UserProfile::default());
    }

    #[tokio::test]
    async fn channel_info_rejects_direct_message_ids_without_a_request() {
        let error = client()
            .channel_info("D024BE91L")
            .await
            .expect_err("dm id must be rejected");
        match error {
            WebApiError::DirectMessage(id) => assert_eq!(id, "D024BE91L"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn direct_message_ids_are_detected() {
        assert!(is_direct_message_channel("D024BE91L"));
        assert!(!is_direct_message_channel("C024BE91L"));
        assert!(!is_direct_message_channel(""));
    }

    #[test]
    fn summarize_extracts_json_error_field() {
        assert_eq!(summarize_error_body(r#"{"error":"invalid_auth"}"#), "invalid_auth");
        assert_eq!(summarize_error_body("plain text"), "plain text");
    }

    #[test]
    fn web_api_client_routes_bases() {
        assert_eq!(client().base_url(), WEB_API_BASE_URL);
        assert_eq!(
            client().with_local_mode(true).base_url(),
            LOCAL_WEB_API_BASE_URL
        );
        assert_eq!(
            client()
                .with_local_mode(true)
                .with_api_base("http://127.0.0.1:4000/")
                .base_url(),
            "http://127.0.0.1:4000"
        );
    }
}
