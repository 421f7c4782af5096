//! Per-identity async locks
//!
//! `init_user` and connection teardown for the same identity each span several
//! directory calls. Holding the identity's lock across the whole sequence keeps
//! a join from interleaving with a departure of the same identity, while
//! unrelated identities proceed in parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by identity
#[derive(Debug, Default)]
pub struct IdentityLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held while an identity's lifecycle sequence runs
///
/// Dropping the guard releases the lock and prunes the table entry when no
/// other task is waiting on it.
pub struct IdentityGuard {
    identity: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl IdentityLocks {
    /// Create an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `identity`
    pub async fn acquire(&self, identity: &str) -> IdentityGuard {
        let lock = self
            .locks
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;

        IdentityGuard {
            identity: identity.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of identities with a live lock entry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if no lock entries exist
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl IdentityGuard {
    /// Identity this guard holds
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table itself still references an idle lock
        self.locks
            .remove_if(&self.identity, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl std::fmt::Debug for IdentityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityGuard")
            .field("identity", &self.identity)
            .finish()
    }
}
