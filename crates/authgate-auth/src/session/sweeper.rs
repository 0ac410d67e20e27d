//! Periodic pruning of stale user index entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use authgate_core::result::AppResult;

use super::store::SessionStore;

/// Removes index members whose session record has expired.
#[derive(Clone)]
pub struct SessionSweeper {
    store: Arc<dyn SessionStore>,
    interval: Duration,
}

impl std::fmt::Debug for SessionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSweeper")
            .field("interval", &self.interval)
            .finish()
    }
}

impl SessionSweeper {
    /// Create a sweeper that runs every `interval`.
    pub fn new(store: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run one sweep. Returns the number of entries removed.
    pub async fn run_once(&self) -> AppResult<u64> {
        let removed = self.store.sweep_all().await?;
        if removed > 0 {
            info!(removed, "Pruned stale session index entries");
        }
        Ok(removed)
    }

    /// Sweep on every tick until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "Session sweeper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Session sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Session sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use authgate_core::types::UserId;
    use authgate_entity::session::{Session, SessionTtls};

    use super::super::memory::MemorySessionStore;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_prunes_then_stops_on_shutdown() {
        let store = Arc::new(MemorySessionStore::new());
        let user_id = UserId::new();
        let now = Utc::now();
        for (id, ttl) in [("s-1", 30), ("s-2", 3600)] {
            let session = Session {
                id: id.to_string(),
                user_id,
                device: String::new(),
                ip: String::new(),
                current_jti: format!("j-{id}"),
                created_at: now,
                updated_at: now,
                expires_at: now,
            };
            let ttls = SessionTtls {
                session_ttl_seconds: ttl,
                jti_ttl_seconds: ttl,
            };
            store.create(&session, ttls).await.unwrap();
        }

        let (tx, rx) = watch::channel(false);
        let sweeper = SessionSweeper::new(store.clone(), Duration::from_secs(60));
        let handle = tokio::spawn(sweeper.run(rx));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.index_len(user_id).await, 1);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
