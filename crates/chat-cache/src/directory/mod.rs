//! User directory implementations of [`chat_core::DirectoryStore`].

mod memory_directory;
mod redis_directory;

pub use memory_directory::MemoryDirectory;
pub use redis_directory::RedisDirectory;
