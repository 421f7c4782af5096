//! Process-local user directory.
//!
//! Mirrors the Redis layout in memory. Used by `DIRECTORY_BACKEND=memory` and
//! throughout the gateway tests.

use async_trait::async_trait;
use chat_core::{ChatRecord, DirectoryStore, RepoResult, UserProfile, VisitRecord};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<String, UserProfile>,
    roster: BTreeMap<String, UserProfile>,
    visits: Vec<VisitRecord>,
    messages: Vec<ChatRecord>,
}

/// In-memory [`DirectoryStore`]
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the visit log
    pub fn visits(&self) -> Vec<VisitRecord> {
        self.state.lock().visits.clone()
    }

    /// Snapshot of the chat history log
    pub fn messages(&self) -> Vec<ChatRecord> {
        self.state.lock().messages.clone()
    }

    /// Number of roster members
    pub fn roster_len(&self) -> usize {
        self.state.lock().roster.len()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn get_user(&self, uuid: &str) -> RepoResult<Option<UserProfile>> {
        Ok(self.state.lock().users.get(uuid).cloned())
    }

    async fn save_user(&self, user: &UserProfile) -> RepoResult<()> {
        let mut state = self.state.lock();
        state.users.insert(user.uuid.clone(), user.clone());
        if let Some(entry) = state.roster.get_mut(&user.uuid) {
            *entry = user.clone();
        }
        Ok(())
    }

    async fn add_user(&self, user: &UserProfile) -> RepoResult<usize> {
        let mut state = self.state.lock();
        state
            .roster
            .entry(user.uuid.clone())
            .or_insert_with(|| user.clone());
        state.visits.push(VisitRecord::now(user.clone()));
        Ok(state.roster.len())
    }

    async fn remove_user(&self, uuid: &str) -> RepoResult<usize> {
        let mut state = self.state.lock();
        state.users.remove(uuid);
        state.roster.remove(uuid);
        Ok(state.roster.len())
    }

    async fn list_users(&self) -> RepoResult<Vec<UserProfile>> {
        Ok(self.state.lock().roster.values().cloned().collect())
    }

    async fn record_message(&self, record: &ChatRecord) -> RepoResult<()> {
        self.state.lock().messages.push(record.clone());
        Ok(())
    }
}
