//! Directory store trait (port) - durable user directory
//!
//! The gateway defines what it needs from persistent storage; `chat-cache`
//! provides the Redis and in-memory implementations.

use async_trait::async_trait;

use crate::entities::{ChatRecord, UserProfile};
use crate::error::DomainError;

/// Result type for directory operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Key prefix for per-user profile records (`user_<uuid>`)
pub const USER_KEY_PREFIX: &str = "user_";
/// Key of the roster map (uuid -> profile)
pub const ROSTER_KEY: &str = "group_users";
/// Append-only list of roster visits
pub const VISIT_LOG_KEY: &str = "all_user_log";
/// Append-only list of broadcast chat messages
pub const CHAT_LOG_KEY: &str = "webchat_records";

/// Persistent user directory: profiles, the roster, and the append-only logs
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch the profile stored under `user_<uuid>`
    async fn get_user(&self, uuid: &str) -> RepoResult<Option<UserProfile>>;

    /// Write the profile record and refresh the user's roster entry if present
    async fn save_user(&self, user: &UserProfile) -> RepoResult<()>;

    /// Add the user to the roster (no-op if already a member), append a visit
    /// record, and return the roster size afterwards
    async fn add_user(&self, user: &UserProfile) -> RepoResult<usize>;

    /// Delete the profile record and roster entry, returning the roster size afterwards
    async fn remove_user(&self, uuid: &str) -> RepoResult<usize>;

    /// All roster members
    async fn list_users(&self) -> RepoResult<Vec<UserProfile>>;

    /// Append a chat message to the history log
    async fn record_message(&self, record: &ChatRecord) -> RepoResult<()>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> RepoResult<()> {
        Ok(())
    }
}
