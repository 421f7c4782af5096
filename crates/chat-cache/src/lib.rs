//! # chat-cache
//!
//! Storage adapters for the user directory.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Redis Directory**: profiles under `user_<uuid>`, the `group_users` roster,
//!   and the `all_user_log` / `webchat_records` lists
//! - **Memory Directory**: process-local directory for development and tests
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::{RedisDirectory, RedisPool, RedisPoolConfig};
//! use chat_core::{DirectoryStore, UserProfile};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let directory = RedisDirectory::new(pool);
//!
//! let user = UserProfile::new("u1", "zhangsan", "http://app.com/pic.jpg");
//! directory.save_user(&user).await?;
//! let count = directory.add_user(&user).await?;
//! ```

pub mod directory;
pub mod pool;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export directory types
pub use directory::{MemoryDirectory, RedisDirectory};
