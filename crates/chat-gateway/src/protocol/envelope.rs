//! Outbound envelope format
//!
//! Every frame the gateway sends has the shape `{"type": ..., "data": {...}}`.

use chat_core::{ChatRecord, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Greeting sent to every new connection
pub const WELCOME_MESSAGE: &str = "welcome to webchat";

/// Sent when [`Envelope::encode`] cannot serialize its data
const ENCODE_FALLBACK: &str = r#"{"type":"error","data":{"msg":"internal error"}}"#;

/// Envelope type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    /// Greeting on connect
    Connect,
    /// An identity came online
    NewUserJoin,
    /// A chat message
    ServerMsg,
    /// Reply to `ping`
    Pong,
    /// Error reply to the requesting connection
    Error,
    /// An identity went offline
    Close,
}

impl EnvelopeType {
    /// Wire name of this type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::NewUserJoin => "new_user_join",
            Self::ServerMsg => "server_msg",
            Self::Pong => "pong",
            Self::Error => "error",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for EnvelopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound gateway frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    pub data: Value,
}

impl Envelope {
    /// Create an envelope with arbitrary data
    #[must_use]
    pub fn new(kind: EnvelopeType, data: Value) -> Self {
        Self { kind, data }
    }

    /// `connect` greeting
    #[must_use]
    pub fn welcome() -> Self {
        Self::new(EnvelopeType::Connect, json!({ "msg": WELCOME_MESSAGE }))
    }

    /// `new_user_join` carrying the joining profile and the roster size
    #[must_use]
    pub fn new_user_join(user: &UserProfile, count: usize) -> Self {
        Self::new(
            EnvelopeType::NewUserJoin,
            json!({ "user": user, "count": count }),
        )
    }

    /// `server_msg` carrying a chat record
    #[must_use]
    pub fn server_msg(record: &ChatRecord) -> Self {
        Self::new(
            EnvelopeType::ServerMsg,
            serde_json::to_value(record).unwrap_or_else(|_| json!({})),
        )
    }

    /// `pong` with empty data
    #[must_use]
    pub fn pong() -> Self {
        Self::new(EnvelopeType::Pong, json!({}))
    }

    /// `error` echoing the given data object
    #[must_use]
    pub fn error(data: Map<String, Value>) -> Self {
        Self::new(EnvelopeType::Error, Value::Object(data))
    }

    /// `error` with a single `msg` field
    #[must_use]
    pub fn error_message(msg: impl Into<String>) -> Self {
        Self::new(EnvelopeType::Error, json!({ "msg": msg.into() }))
    }

    /// `close` carrying the departed profile
    #[must_use]
    pub fn close(user: &UserProfile) -> Self {
        Self::new(EnvelopeType::Close, json!({ "user": user }))
    }

    /// Serialize to a JSON text frame
    ///
    /// Non-ASCII text is written as-is, not `\u` escaped.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(kind = %self.kind, error = %e, "Failed to encode envelope");
            ENCODE_FALLBACK.to_string()
        })
    }

    /// Parse a JSON text frame
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
