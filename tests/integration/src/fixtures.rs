//! Test fixtures and data generators

use chat_core::UserProfile;
use serde_json::{json, Value};

/// Profile with a fresh random identity
pub fn unique_profile(uname: &str) -> UserProfile {
    UserProfile::new(
        uuid::Uuid::new_v4().to_string(),
        uname,
        format!("http://app.com/{uname}.jpg"),
    )
}

/// `init_user` data for `user`
pub fn init_user_data(user: &UserProfile) -> Value {
    json!({ "uuid": user.uuid, "uname": user.uname, "avatar": user.avatar })
}

/// `msg_all` data
pub fn msg_all_data(msg: &str) -> Value {
    json!({ "msg": msg })
}
