//! `init_user` handler

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{Envelope, InitUserPayload};
use crate::server::GatewayState;
use chat_core::UserProfile;
use std::sync::Arc;

/// Associates a connection with an identity
pub struct InitUserHandler;

impl InitUserHandler {
    /// Register the connection under `payload.uuid`.
    ///
    /// Only the identity's first connection persists the profile and announces
    /// `new_user_join`; later connections of the same identity join silently.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: InitUserPayload,
    ) -> HandlerResult<()> {
        if connection.is_associated() {
            return Err(HandlerError::AlreadyInitialized);
        }

        let _guard = state.identity_locks().acquire(&payload.uuid).await;
        let registration = state.registry().register(&payload.uuid, connection);

        tracing::info!(
            connection_id = %connection.id(),
            identity = %payload.uuid,
            slot = registration.slot,
            is_new_identity = registration.is_new_identity,
            "Connection associated"
        );

        if !registration.is_new_identity {
            return Ok(());
        }

        let user = UserProfile::new(payload.uuid, payload.uname, payload.avatar);

        if let Err(e) = state.directory().save_user(&user).await {
            tracing::warn!(identity = %user.uuid, error = %e, code = e.code(), "Failed to save profile");
        }

        let count = match state.directory().add_user(&user).await {
            Ok(count) => count,
            Err(e) => {
                let fallback = state.registry().identity_count();
                tracing::warn!(
                    identity = %user.uuid,
                    error = %e,
                    code = e.code(),
                    fallback,
                    "Failed to add roster entry, using live identity count"
                );
                fallback
            }
        };

        state
            .broadcaster()
            .broadcast(&Envelope::new_user_join(&user, count));

        Ok(())
    }
}
