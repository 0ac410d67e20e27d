//! Invalidation bus configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Invalidation bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Upper bound on a single handler run, in seconds.
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_seconds: u64,
}

impl EventsConfig {
    /// Handler timeout as a duration.
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_seconds)
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            handler_timeout_seconds: default_handler_timeout(),
        }
    }
}

fn default_handler_timeout() -> u64 {
    10
}
