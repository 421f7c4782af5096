//! Registry-wide fan-out

use crate::connection::{Connection, ConnectionRegistry};
use crate::protocol::Envelope;
use std::sync::Arc;

/// Delivery counts of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends envelopes to registered connections
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Send to every registered connection
    pub fn broadcast(&self, envelope: &Envelope) -> BroadcastReport {
        self.broadcast_except(envelope, None)
    }

    /// Send to every registered connection whose identity is not `exclude`.
    ///
    /// The envelope is encoded once. A failed send to one connection is logged
    /// and never stops delivery to the rest.
    pub fn broadcast_except(&self, envelope: &Envelope, exclude: Option<&str>) -> BroadcastReport {
        let payload = envelope.encode();
        let mut report = BroadcastReport::default();

        for (identity, connections) in self.registry.all_connections() {
            if exclude == Some(identity.as_str()) {
                continue;
            }

            for conn in connections {
                match conn.send_text(payload.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            connection_id = %conn.id(),
                            identity = %identity,
                            kind = %envelope.kind,
                            error = %e,
                            "Broadcast delivery failed"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            kind = %envelope.kind,
            payload = %payload,
            sent = report.delivered,
            failed = report.failed,
            "Envelope broadcast"
        );

        report
    }

    /// Send to a single connection, logging any failure
    pub fn send_to(connection: &Connection, envelope: &Envelope) -> bool {
        match connection.send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    kind = %envelope.kind,
                    error = %e,
                    "Direct send failed"
                );
                false
            }
        }
    }
}
