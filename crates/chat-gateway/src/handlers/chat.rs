//! `msg_all` handler

use super::{resolve_profile, HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{Envelope, MsgAllPayload};
use crate::server::GatewayState;
use chat_core::ChatRecord;
use std::sync::Arc;

/// Broadcasts chat messages
pub struct ChatHandler;

impl ChatHandler {
    /// Record the message and send `server_msg` to every connection, sender included.
    ///
    /// Whitespace-only messages are dropped without a reply.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: MsgAllPayload,
    ) -> HandlerResult<()> {
        let identity = connection
            .identity()
            .ok_or(HandlerError::MissingIdentity { action: "msg_all" })?;

        if payload.msg.trim().is_empty() {
            tracing::trace!(connection_id = %connection.id(), identity = %identity, "Dropped empty message");
            return Ok(());
        }

        let user = resolve_profile(state, &identity).await;
        let record = ChatRecord::new(payload.msg, user);

        if let Err(e) = state.directory().record_message(&record).await {
            tracing::warn!(identity = %identity, error = %e, code = e.code(), "Failed to record message");
        }

        let report = state.broadcaster().broadcast(&Envelope::server_msg(&record));
        tracing::trace!(identity = %identity, sent = report.delivered, "Chat message broadcast");

        Ok(())
    }
}
