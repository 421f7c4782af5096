//! `ping`, `error` and unrecognized actions

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::Envelope;
use serde_json::{Map, Value};

/// Reply sent for an unrecognized action
pub const UNKNOWN_REQUEST: &str = "unknown request type";

/// Replies that go only to the requesting connection
pub struct ControlHandler;

impl ControlHandler {
    /// Reply `pong`
    pub fn ping(connection: &Connection) -> HandlerResult<()> {
        tracing::trace!(connection_id = %connection.id(), "Ping received");
        connection.send(&Envelope::pong())?;
        Ok(())
    }

    /// Echo `data` back as an `error` envelope
    pub fn echo_error(connection: &Connection, data: Map<String, Value>) -> HandlerResult<()> {
        connection.send(&Envelope::error(data))?;
        Ok(())
    }

    /// Tell the client the action is not supported
    pub fn unknown(connection: &Connection, action: &str) -> HandlerResult<()> {
        tracing::debug!(connection_id = %connection.id(), action = %action, "Unknown action");
        connection.send(&Envelope::error_message(UNKNOWN_REQUEST))?;
        Ok(())
    }
}
