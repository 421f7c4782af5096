//! Action handlers
//!
//! Routes each decoded client request to its handler and runs connection
//! teardown.

mod chat;
mod control;
mod error;
mod init_user;
mod lifecycle;
mod profile;

pub use chat::ChatHandler;
pub use control::{ControlHandler, UNKNOWN_REQUEST};
pub use error::{HandlerError, HandlerResult};
pub use init_user::InitUserHandler;
pub use lifecycle::LifecycleController;
pub use profile::ProfileHandler;

use crate::broadcast::Broadcaster;
use crate::connection::Connection;
use crate::protocol::Request;
use crate::server::GatewayState;
use chat_core::UserProfile;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Decode one text frame, dispatch it, and reply with an error envelope
    /// if the handler rejected it
    pub async fn handle_frame(state: &GatewayState, connection: &Arc<Connection>, raw: &str) {
        let request = Request::decode(raw);

        tracing::trace!(
            connection_id = %connection.id(),
            action = %request.action(),
            "Received request"
        );

        if let Err(e) = Self::dispatch(state, connection, request).await {
            tracing::debug!(
                connection_id = %connection.id(),
                error = %e,
                "Request rejected"
            );
            if let Some(envelope) = e.to_envelope() {
                Broadcaster::send_to(connection, &envelope);
            }
        }
    }

    /// Handle a decoded client request
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        request: Request,
    ) -> HandlerResult<()> {
        match request {
            Request::InitUser(payload) => InitUserHandler::handle(state, connection, payload).await,
            Request::MsgAll(payload) => ChatHandler::handle(state, connection, payload).await,
            Request::EditUserInfo(payload) => {
                ProfileHandler::handle(state, connection, payload).await
            }
            Request::Ping => ControlHandler::ping(connection),
            Request::Error(data) => ControlHandler::echo_error(connection, data),
            Request::Invalid { action, reason } => {
                Err(HandlerError::InvalidPayload { action, reason })
            }
            Request::Unknown { action } => ControlHandler::unknown(connection, &action),
        }
    }
}

/// Stored profile of `identity`, or a placeholder when the directory has none
/// or cannot be reached
pub(crate) async fn resolve_profile(state: &GatewayState, identity: &str) -> UserProfile {
    match state.directory().get_user(identity).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(identity = %identity, "No stored profile, using placeholder");
            UserProfile::placeholder(identity)
        }
        Err(e) => {
            tracing::warn!(
                identity = %identity,
                error = %e,
                code = e.code(),
                "Profile lookup failed, using placeholder"
            );
            UserProfile::placeholder(identity)
        }
    }
}
