//! Ports implemented by the infrastructure layer

mod directory;

pub use directory::{
    DirectoryStore, RepoResult, CHAT_LOG_KEY, ROSTER_KEY, USER_KEY_PREFIX, VISIT_LOG_KEY,
};
