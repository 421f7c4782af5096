//! Gateway state
//!
//! Application state for the gateway server.

use crate::broadcast::Broadcaster;
use crate::connection::{ConnectionRegistry, IdentityLocks};
use chat_common::AppConfig;
use chat_core::DirectoryStore;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Persistent user directory
    directory: Arc<dyn DirectoryStore>,
    /// Live connections by identity
    registry: Arc<ConnectionRegistry>,
    /// Fan-out over the registry
    broadcaster: Broadcaster,
    /// Orders join and departure of the same identity
    identity_locks: Arc<IdentityLocks>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state with an empty registry
    pub fn new(directory: Arc<dyn DirectoryStore>, config: AppConfig) -> Self {
        let registry = ConnectionRegistry::new_shared();
        Self {
            directory,
            broadcaster: Broadcaster::new(Arc::clone(&registry)),
            registry,
            identity_locks: Arc::new(IdentityLocks::new()),
            config: Arc::new(config),
        }
    }

    /// Get the user directory
    pub fn directory(&self) -> &dyn DirectoryStore {
        self.directory.as_ref()
    }

    /// Get the connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Get the broadcaster
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Get the per-identity locks
    pub fn identity_locks(&self) -> &IdentityLocks {
        &self.identity_locks
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("config", &"AppConfig")
            .finish()
    }
}
