//! `edit_userinfo` handler

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::EditUserInfoPayload;
use crate::server::GatewayState;
use chat_core::UserProfile;
use std::sync::Arc;

/// Updates the stored profile of the connection's identity
pub struct ProfileHandler;

impl ProfileHandler {
    /// Overwrite the profile. Nothing is broadcast.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: EditUserInfoPayload,
    ) -> HandlerResult<()> {
        let identity = connection
            .identity()
            .ok_or(HandlerError::MissingIdentity {
                action: "edit_userinfo",
            })?;

        let user = UserProfile::new(identity, payload.uname, payload.avatar);
        match state.directory().save_user(&user).await {
            Ok(()) => tracing::debug!(identity = %user.uuid, "Profile updated"),
            Err(e) => {
                tracing::warn!(identity = %user.uuid, error = %e, code = e.code(), "Failed to update profile");
            }
        }

        Ok(())
    }
}
