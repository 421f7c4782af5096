//! Handler error types

use crate::connection::SendError;
use crate::protocol::Envelope;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Required data fields missing or of the wrong type
    #[error("Invalid {action} payload: {reason}")]
    InvalidPayload {
        action: &'static str,
        reason: String,
    },

    /// Action needs an identity but the connection has none
    #[error("{action} before init_user")]
    MissingIdentity { action: &'static str },

    /// `init_user` on a connection that already has an identity
    #[error("Connection already initialized")]
    AlreadyInitialized,

    /// Reply could not be queued
    #[error("Reply not delivered: {0}")]
    Send(#[from] SendError),
}

impl HandlerError {
    /// Error envelope for the requesting connection, if one should be sent
    pub fn to_envelope(&self) -> Option<Envelope> {
        match self {
            Self::InvalidPayload { action, .. } => {
                Some(Envelope::error_message(format!("invalid {action} payload")))
            }
            Self::MissingIdentity { .. } => Some(Envelope::error_message("user not initialized")),
            Self::AlreadyInitialized => Some(Envelope::error_message("user already initialized")),
            Self::Send(_) => None,
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
