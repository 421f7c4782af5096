//! Append-only log records: chat history and roster visits

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Timestamp format used in the visit log
pub const VISIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One broadcast chat message, persisted to the chat history log and sent as
/// the `server_msg` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub msg: String,
    pub user: UserProfile,
    /// Unix timestamp (seconds)
    pub send_time: i64,
}

impl ChatRecord {
    /// Create a record stamped with the current time
    pub fn new(msg: impl Into<String>, user: UserProfile) -> Self {
        Self::at(msg, user, Utc::now())
    }

    /// Create a record stamped with the given time
    pub fn at(msg: impl Into<String>, user: UserProfile, sent_at: DateTime<Utc>) -> Self {
        Self {
            msg: msg.into(),
            user,
            send_time: sent_at.timestamp(),
        }
    }
}

/// Entry of the visit log, appended whenever a user joins the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(flatten)]
    pub user: UserProfile,
    /// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`
    pub time: String,
}

impl VisitRecord {
    /// Create a visit entry for `user` at the current local time
    pub fn now(user: UserProfile) -> Self {
        Self {
            user,
            time: Local::now().format(VISIT_TIME_FORMAT).to_string(),
        }
    }
}
