//! Cache provider and Redis configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache provider type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// TTL for cached user role/status facts, in seconds.
    #[serde(default = "default_facts_ttl")]
    pub user_facts_ttl_seconds: u64,
    /// TTL for cached role permission sets, in seconds.
    #[serde(default = "default_facts_ttl")]
    pub role_permissions_ttl_seconds: u64,
    /// Redis connection settings, shared with the session store.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// In-memory cache configuration.
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl CacheConfig {
    /// User facts TTL as a duration.
    pub fn user_facts_ttl(&self) -> Duration {
        Duration::from_secs(self.user_facts_ttl_seconds)
    }

    /// Role permissions TTL as a duration.
    pub fn role_permissions_ttl(&self) -> Duration {
        Duration::from_secs(self.role_permissions_ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            user_facts_ttl_seconds: default_facts_ttl(),
            role_permissions_ttl_seconds: default_facts_ttl(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all AuthGate keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Deadline for a single Redis command or script, in milliseconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
}

impl RedisCacheConfig {
    /// Command deadline as a duration.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
            command_timeout_ms: default_command_timeout(),
        }
    }
}

/// In-memory cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries in the cache.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_facts_ttl() -> u64 {
    86_400
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "authgate:".to_string()
}

fn default_command_timeout() -> u64 {
    2_000
}

fn default_max_capacity() -> u64 {
    10_000
}
