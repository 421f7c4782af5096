//! User entity - the profile a client claims with `init_user`

use serde::{Deserialize, Serialize};

use crate::traits::USER_KEY_PREFIX;

/// Profile of a chat participant
///
/// Field names match the wire format, so the struct serializes directly into
/// `new_user_join`, `server_msg` and `close` payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uuid: String,
    pub uname: String,
    pub avatar: String,
}

impl UserProfile {
    /// Create a new profile
    pub fn new(uuid: impl Into<String>, uname: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            uname: uname.into(),
            avatar: avatar.into(),
        }
    }

    /// Profile carrying only the identity, used when the directory has no record
    pub fn placeholder(uuid: impl Into<String>) -> Self {
        Self::new(uuid, String::new(), String::new())
    }

    /// Directory key holding this profile
    pub fn storage_key(&self) -> String {
        Self::key_for(&self.uuid)
    }

    /// Directory key for the profile of `uuid`
    pub fn key_for(uuid: &str) -> String {
        format!("{USER_KEY_PREFIX}{uuid}")
    }
}
