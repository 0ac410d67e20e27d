//! Session lifetime configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session store backend: `"redis"` or `"memory"` (single node only).
    #[serde(default = "default_store")]
    pub store: String,
    /// Absolute session lifetime in hours, re-armed on every rotation.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u64,
    /// Interval between sweeps of stale user-index members, in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
}

impl SessionConfig {
    /// Session lifetime as a duration.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours.saturating_mul(3600))
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            session_ttl_hours: default_session_ttl(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

fn default_store() -> String {
    "redis".to_string()
}

fn default_session_ttl() -> u64 {
    720
}

fn default_sweep_interval() -> u64 {
    60
}
