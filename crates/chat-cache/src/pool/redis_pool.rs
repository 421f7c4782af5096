//! Redis connection pool using deadpool-redis.
//!
//! Wraps a bounded pool with the four commands the directory issues: JSON
//! string reads and writes, key deletion, and list appends. Every checkout is
//! bounded by the configured timeout so a stalled server surfaces as an error
//! instead of a hung handler.

use deadpool_redis::{Config, Pool, Runtime};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Redis pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Redis connection URL (e.g., `redis://localhost:6379/0`)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: usize,
    /// Bound on waiting for, creating, or recycling a connection
    pub timeout: Duration,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            max_connections: 10,
            timeout: Duration::from_secs(2),
        }
    }
}

impl From<&chat_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &chat_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
            timeout: config.timeout(),
        }
    }
}

impl RedisPoolConfig {
    /// URL with any credentials stripped, for logs
    pub fn redacted_url(&self) -> &str {
        self.url.rsplit('@').next().unwrap_or(&self.url)
    }
}

/// Error type for Redis pool operations
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("No Redis connection available: {0}")]
    Checkout(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Redis pool operations
pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Managed Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    endpoint: String,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("endpoint", &self.endpoint)
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisPool {
    /// Build the pool. No connection is opened until the first command.
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(config.url.as_str())
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .wait_timeout(Some(config.timeout))
            .create_timeout(Some(config.timeout))
            .recycle_timeout(Some(config.timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        let endpoint = config.redacted_url().to_string();
        tracing::info!(
            endpoint = %endpoint,
            max_connections = config.max_connections,
            timeout_ms = config.timeout.as_millis(),
            "Redis pool created"
        );

        Ok(Self { pool, endpoint })
    }

    /// Build the pool from application config
    pub fn from_config(config: &chat_common::RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    async fn connection(&self) -> RedisResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Round-trip a `PING`
    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// `GET` a key and decode its JSON text
    pub async fn read_json<V: DeserializeOwned>(&self, key: &str) -> RedisResult<Option<V>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(raw.map(|text| serde_json::from_str(&text)).transpose()?)
    }

    /// `SET` a key to the JSON text of `value`, without expiry
    pub async fn write_json<V: Serialize>(&self, key: &str, value: &V) -> RedisResult<()> {
        let text = serde_json::to_string(value)?;
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(text)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// `DEL` a key, reporting whether it existed
    pub async fn remove(&self, key: &str) -> RedisResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    /// `RPUSH` the JSON text of `value` onto a list, returning the new length
    pub async fn append_json<V: Serialize>(&self, key: &str, value: &V) -> RedisResult<usize> {
        let text = serde_json::to_string(value)?;
        let mut conn = self.connection().await?;
        let len: usize = redis::cmd("RPUSH")
            .arg(key)
            .arg(text)
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }
}
