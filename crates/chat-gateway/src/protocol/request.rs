//! Inbound request decoding
//!
//! Every text frame decodes to exactly one [`Request`]; decoding never fails.
//! Frames that are not a JSON object become an `error` request carrying
//! [`MALFORMED_PAYLOAD`], which the dispatcher echoes back to the sender.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Message echoed to a client whose frame could not be decoded
pub const MALFORMED_PAYLOAD: &str = "malformed payload";

/// Payload for `init_user`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitUserPayload {
    pub uuid: String,
    pub uname: String,
    pub avatar: String,
}

/// Payload for `msg_all`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MsgAllPayload {
    #[serde(default)]
    pub msg: String,
}

/// Payload for `edit_userinfo`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditUserInfoPayload {
    pub uname: String,
    pub avatar: String,
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Associate the connection with an identity
    InitUser(InitUserPayload),
    /// Broadcast a chat message to everyone
    MsgAll(MsgAllPayload),
    /// Replace the stored profile of the associated identity
    EditUserInfo(EditUserInfoPayload),
    /// Liveness probe
    Ping,
    /// Echo `data` back as an `error` envelope
    Error(Map<String, Value>),
    /// A known action whose data lacked required fields
    Invalid {
        action: &'static str,
        reason: String,
    },
    /// Unrecognized action
    Unknown { action: String },
}

impl Request {
    /// Decode a raw text frame
    pub fn decode(raw: &str) -> Self {
        let object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return Self::malformed(raw, "not a JSON object"),
            Err(e) => return Self::malformed(raw, &e.to_string()),
        };

        let action = match object.get("action") {
            None | Some(Value::Null) => "unknown".to_string(),
            Some(Value::String(action)) => action.clone(),
            // Never a known action name, so it falls through to `Unknown`
            Some(other) => other.to_string(),
        };

        let data = match object.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => Map::new(),
        };

        Self::from_parts(action, data)
    }

    /// Build a request from an action name and its data object
    pub fn from_parts(action: String, data: Map<String, Value>) -> Self {
        match action.as_str() {
            "init_user" => match parse::<InitUserPayload>(data) {
                Ok(payload) if payload.uuid.trim().is_empty() => Self::Invalid {
                    action: "init_user",
                    reason: "uuid is blank".to_string(),
                },
                Ok(payload) => Self::InitUser(payload),
                Err(reason) => Self::Invalid {
                    action: "init_user",
                    reason,
                },
            },
            // A missing or non-string msg is treated as empty and dropped later
            "msg_all" => Self::MsgAll(parse::<MsgAllPayload>(data).unwrap_or_default()),
            "edit_userinfo" => match parse::<EditUserInfoPayload>(data) {
                Ok(payload) => Self::EditUserInfo(payload),
                Err(reason) => Self::Invalid {
                    action: "edit_userinfo",
                    reason,
                },
            },
            "ping" => Self::Ping,
            "error" => Self::Error(data),
            _ => Self::Unknown { action },
        }
    }

    /// Action name, for logging
    pub fn action(&self) -> &str {
        match self {
            Self::InitUser(_) => "init_user",
            Self::MsgAll(_) => "msg_all",
            Self::EditUserInfo(_) => "edit_userinfo",
            Self::Ping => "ping",
            Self::Error(_) => "error",
            Self::Invalid { action, .. } => *action,
            Self::Unknown { action } => action.as_str(),
        }
    }

    fn malformed(raw: &str, reason: &str) -> Self {
        tracing::warn!(raw = %raw, reason = %reason, "Malformed client frame");
        let mut data = Map::new();
        data.insert("msg".to_string(), Value::String(MALFORMED_PAYLOAD.to_string()));
        Self::Error(data)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(data: Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(data)).map_err(|e| e.to_string())
}
