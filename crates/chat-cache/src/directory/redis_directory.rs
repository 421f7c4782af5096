//! Redis-backed user directory.
//!
//! Key layout:
//! - `user_<uuid>`: JSON profile
//! - `group_users`: JSON object mapping uuid to profile
//! - `all_user_log`, `webchat_records`: lists of JSON records (RPUSH)

use crate::pool::{RedisPool, RedisPoolError};
use async_trait::async_trait;
use chat_core::{
    ChatRecord, DirectoryStore, DomainError, RepoResult, UserProfile, VisitRecord, CHAT_LOG_KEY,
    ROSTER_KEY, VISIT_LOG_KEY,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// Roster keyed by uuid
type Roster = BTreeMap<String, UserProfile>;

/// Directory store on top of a [`RedisPool`]
pub struct RedisDirectory {
    pool: RedisPool,
    /// Serializes read-modify-write cycles on `group_users` within this process
    roster_lock: Mutex<()>,
}

impl RedisDirectory {
    /// Create a new Redis directory
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            roster_lock: Mutex::new(()),
        }
    }

    async fn load_roster(&self) -> RepoResult<Roster> {
        let raw: Option<Value> = self
            .pool
            .read_json(ROSTER_KEY)
            .await
            .map_err(|e| map_pool_error(ROSTER_KEY, e))?;

        match raw {
            Some(value) => decode_roster(value),
            None => Ok(Roster::new()),
        }
    }

    async fn store_roster(&self, roster: &Roster) -> RepoResult<()> {
        self.pool
            .write_json(ROSTER_KEY, roster)
            .await
            .map_err(|e| map_pool_error(ROSTER_KEY, e))
    }
}

impl std::fmt::Debug for RedisDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDirectory")
            .field("pool", &self.pool)
            .finish()
    }
}

#[async_trait]
impl DirectoryStore for RedisDirectory {
    async fn get_user(&self, uuid: &str) -> RepoResult<Option<UserProfile>> {
        let key = UserProfile::key_for(uuid);
        self.pool
            .read_json(&key)
            .await
            .map_err(|e| map_pool_error(&key, e))
    }

    async fn save_user(&self, user: &UserProfile) -> RepoResult<()> {
        let key = user.storage_key();
        self.pool
            .write_json(&key, user)
            .await
            .map_err(|e| map_pool_error(&key, e))?;

        let _guard = self.roster_lock.lock().await;
        let mut roster = self.load_roster().await?;
        if let Some(entry) = roster.get_mut(&user.uuid) {
            if entry != user {
                *entry = user.clone();
                self.store_roster(&roster).await?;
            }
        }

        tracing::debug!(uuid = %user.uuid, "Saved user profile");
        Ok(())
    }

    async fn add_user(&self, user: &UserProfile) -> RepoResult<usize> {
        let count = {
            let _guard = self.roster_lock.lock().await;
            let mut roster = self.load_roster().await?;
            if !roster.contains_key(&user.uuid) {
                roster.insert(user.uuid.clone(), user.clone());
                self.store_roster(&roster).await?;
            }
            roster.len()
        };

        self.pool
            .append_json(VISIT_LOG_KEY, &VisitRecord::now(user.clone()))
            .await
            .map_err(|e| map_pool_error(VISIT_LOG_KEY, e))?;

        tracing::debug!(uuid = %user.uuid, count, "Added user to roster");
        Ok(count)
    }

    async fn remove_user(&self, uuid: &str) -> RepoResult<usize> {
        let key = UserProfile::key_for(uuid);
        self.pool
            .remove(&key)
            .await
            .map_err(|e| map_pool_error(&key, e))?;

        let _guard = self.roster_lock.lock().await;
        let mut roster = self.load_roster().await?;
        if roster.remove(uuid).is_some() {
            self.store_roster(&roster).await?;
        }

        tracing::debug!(uuid = %uuid, count = roster.len(), "Removed user from roster");
        Ok(roster.len())
    }

    async fn list_users(&self) -> RepoResult<Vec<UserProfile>> {
        Ok(self.load_roster().await?.into_values().collect())
    }

    async fn record_message(&self, record: &ChatRecord) -> RepoResult<()> {
        self.pool
            .append_json(CHAT_LOG_KEY, record)
            .await
            .map_err(|e| map_pool_error(CHAT_LOG_KEY, e))?;
        Ok(())
    }

    async fn health_check(&self) -> RepoResult<()> {
        self.pool
            .ping()
            .await
            .map_err(|e| DomainError::DirectoryUnavailable(e.to_string()))
    }
}

/// Decode the stored roster.
///
/// An empty JSON array is accepted as an empty roster; older writers encoded
/// an empty map that way.
fn decode_roster(value: Value) -> RepoResult<Roster> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Roster::new()),
        Value::Object(_) => serde_json::from_value(value).map_err(|e| DomainError::CorruptRecord {
            key: ROSTER_KEY.to_string(),
            reason: e.to_string(),
        }),
        other => Err(DomainError::CorruptRecord {
            key: ROSTER_KEY.to_string(),
            reason: format!("expected a JSON object, found {other}"),
        }),
    }
}

fn map_pool_error(key: &str, err: RedisPoolError) -> DomainError {
    match err {
        RedisPoolError::Serialization(e) => DomainError::CorruptRecord {
            key: key.to_string(),
            reason: e.to_string(),
        },
        other => DomainError::DirectoryUnavailable(other.to_string()),
    }
}
