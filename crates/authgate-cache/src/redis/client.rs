//! Redis connection management.

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tracing::info;

use authgate_core::config::cache::RedisCacheConfig;
use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;

/// Redis client wrapper with connection management.
///
/// Cloning is cheap; every clone shares the same multiplexed connection.
#[derive(Debug, Clone)]
pub struct RedisClient {
    /// Redis connection manager (multiplexed, reconnecting).
    conn: ConnectionManager,
    /// Key prefix for all keys.
    key_prefix: String,
    /// Deadline applied to every command.
    command_timeout: Duration,
}

impl RedisClient {
    /// Create a new Redis client from configuration.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        info!(url = %mask_redis_url(&config.url), "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Cache, "Failed to connect to Redis", e)
        })?;

        info!("Successfully connected to Redis");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            command_timeout: config.command_timeout(),
        })
    }

    /// Get a mutable clone of the connection manager.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Return the key prefix.
    pub fn prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Run one Redis round-trip under the configured deadline.
    ///
    /// Both a Redis error and an elapsed deadline surface as
    /// [`ErrorKind::Cache`]. Nothing is retried.
    pub async fn with_deadline<T, F>(&self, op: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_err(op, e)),
            Err(_) => Err(AppError::cache(format!(
                "Redis {op} timed out after {}ms",
                self.command_timeout.as_millis()
            ))),
        }
    }
}

/// Map a Redis error to an [`AppError`].
pub fn map_redis_err(op: &str, e: RedisError) -> AppError {
    AppError::with_source(ErrorKind::Cache, format!("Redis {op} failed: {e}"), e)
}

/// Mask password in Redis URL for safe logging.
fn mask_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
