//! Connection registry
//!
//! Maps each identity to the set of live connections that claimed it. Every
//! mutation happens under one lock and never awaits, so readers always see a
//! consistent snapshot: an identity is present iff it has at least one
//! connection.

use super::Connection;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Result of [`ConnectionRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Slot assigned to the connection within its identity
    pub slot: u64,
    /// Whether the identity had no connections before this one
    pub is_new_identity: bool,
}

/// Result of [`ConnectionRegistry::unregister`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unregistration {
    /// The connection was not registered
    AlreadyAbsent,
    /// The identity still has other connections
    Remaining { identity: String, remaining: usize },
    /// The connection was the identity's last one
    Vacated { identity: String },
}

impl Unregistration {
    /// Whether the identity is now gone from the registry
    pub fn is_identity_empty(&self) -> bool {
        matches!(self, Self::Vacated { .. })
    }
}

#[derive(Default)]
struct RegistryEntry {
    connections: BTreeMap<u64, Arc<Connection>>,
    next_slot: u64,
}

/// Identity to connections map
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Mutex<HashMap<String, RegistryEntry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add `connection` under `identity` and bind it to the assigned slot.
    ///
    /// Slots within an identity are never reused while the identity is present.
    pub fn register(&self, identity: &str, connection: &Arc<Connection>) -> Registration {
        let mut entries = self.entries.lock();
        let is_new_identity = !entries.contains_key(identity);
        let entry = entries.entry(identity.to_string()).or_default();

        let slot = entry.next_slot;
        entry.next_slot += 1;
        entry.connections.insert(slot, Arc::clone(connection));
        connection.associate(identity, slot);

        tracing::debug!(
            connection_id = %connection.id(),
            identity = %identity,
            slot,
            is_new_identity,
            "Connection registered"
        );

        Registration {
            slot,
            is_new_identity,
        }
    }

    /// Remove `connection` from its identity.
    ///
    /// Safe to call more than once; later calls report [`Unregistration::AlreadyAbsent`].
    pub fn unregister(&self, connection: &Connection) -> Unregistration {
        let mut entries = self.entries.lock();
        let Some(association) = connection.association() else {
            return Unregistration::AlreadyAbsent;
        };
        let Some(entry) = entries.get_mut(&association.identity) else {
            return Unregistration::AlreadyAbsent;
        };

        let owned = entry
            .connections
            .get(&association.slot)
            .is_some_and(|c| c.id() == connection.id());
        if !owned {
            return Unregistration::AlreadyAbsent;
        }

        entry.connections.remove(&association.slot);
        connection.dissociate();

        let remaining = entry.connections.len();
        tracing::debug!(
            connection_id = %connection.id(),
            identity = %association.identity,
            slot = association.slot,
            remaining,
            "Connection unregistered"
        );

        if remaining == 0 {
            entries.remove(&association.identity);
            Unregistration::Vacated {
                identity: association.identity,
            }
        } else {
            Unregistration::Remaining {
                identity: association.identity,
                remaining,
            }
        }
    }

    /// Connections of `identity`, in slot order
    pub fn connections_of(&self, identity: &str) -> Vec<Arc<Connection>> {
        self.entries
            .lock()
            .get(identity)
            .map(|entry| entry.connections.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every identity and its connections
    pub fn all_connections(&self) -> Vec<(String, Vec<Arc<Connection>>)> {
        self.entries
            .lock()
            .iter()
            .map(|(identity, entry)| {
                (
                    identity.clone(),
                    entry.connections.values().cloned().collect(),
                )
            })
            .collect()
    }

    /// Check if `identity` has any connection
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.lock().contains_key(identity)
    }

    /// Number of identities with at least one connection
    pub fn identity_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Total number of registered connections
    pub fn connection_count(&self) -> usize {
        self.entries
            .lock()
            .values()
            .map(|entry| entry.connections.len())
            .sum()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("identities", &self.identity_count())
            .field("connections", &self.connection_count())
            .finish()
    }
}
