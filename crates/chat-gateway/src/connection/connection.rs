//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection: its outbound queue, the identity
//! it claimed (if any), and activity timestamps for the idle monitor.

use crate::protocol::Envelope;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Open, no `init_user` yet
    Unassociated,
    /// Bound to an identity in the registry
    Associated,
    /// Transport closed
    Closed,
}

/// Identity and slot assigned by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub identity: String,
    pub slot: u64,
}

/// Outbound delivery failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The outbound queue is full
    #[error("outbound queue full")]
    Full,
    /// The writer task has gone away
    #[error("connection closed")]
    Closed,
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection ID
    id: String,

    /// Identity binding, written only by the registry
    association: Mutex<Option<Association>>,

    /// Set once when the transport closes
    closed: AtomicBool,

    /// Queue drained by the connection's writer task
    sender: mpsc::Sender<String>,

    /// Last inbound frame
    last_activity: Mutex<Instant>,

    /// Connection creation time
    created_at: Instant,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: String, sender: mpsc::Sender<String>) -> Arc<Self> {
        let now = Instant::now();
        Arc::new(Self {
            id,
            association: Mutex::new(None),
            closed: AtomicBool::new(false),
            sender,
            last_activity: Mutex::new(now),
            created_at: now,
        })
    }

    /// Generate a new unique connection ID
    #[must_use]
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Get the connection ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identity this connection is bound to
    pub fn identity(&self) -> Option<String> {
        self.association.lock().as_ref().map(|a| a.identity.clone())
    }

    /// Slot within the identity's connection set
    pub fn slot(&self) -> Option<u64> {
        self.association.lock().as_ref().map(|a| a.slot)
    }

    /// Current association, if any
    pub fn association(&self) -> Option<Association> {
        self.association.lock().clone()
    }

    /// Check if the connection is bound to an identity
    pub fn is_associated(&self) -> bool {
        self.association.lock().is_some()
    }

    pub(crate) fn associate(&self, identity: &str, slot: u64) {
        *self.association.lock() = Some(Association {
            identity: identity.to_string(),
            slot,
        });
    }

    pub(crate) fn dissociate(&self) -> Option<Association> {
        self.association.lock().take()
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        if self.is_closed() {
            ConnectionState::Closed
        } else if self.is_associated() {
            ConnectionState::Associated
        } else {
            ConnectionState::Unassociated
        }
    }

    /// Mark the transport closed.
    ///
    /// Returns `true` only for the first call.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    /// Check if the transport has closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Record inbound activity
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last inbound frame
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Get connection age
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue a text frame without waiting
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        self.sender.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Encode and queue an envelope for this connection only
    pub fn send(&self, envelope: &Envelope) -> Result<(), SendError> {
        let payload = envelope.encode();
        tracing::debug!(
            connection_id = %self.id,
            kind = %envelope.kind,
            payload = %payload,
            "Sending envelope"
        );
        self.send_text(payload)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("association", &*self.association.lock())
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish()
    }
}
