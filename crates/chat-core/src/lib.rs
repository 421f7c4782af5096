//! # chat-core
//!
//! Domain layer containing the user and chat record entities, domain errors, and
//! the directory store trait. This crate has zero dependencies on infrastructure
//! (Redis, web framework, etc.).

pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{ChatRecord, UserProfile, VisitRecord, VISIT_TIME_FORMAT};
pub use error::DomainError;
pub use traits::{
    DirectoryStore, RepoResult, CHAT_LOG_KEY, ROSTER_KEY, USER_KEY_PREFIX, VISIT_LOG_KEY,
};
