//! In-process session store for tests and single-node development.
//!
//! Expiry follows the tokio clock, so paused-time tests can advance past
//! TTLs deterministically. One mutex guards all three structures, which
//! gives every operation the same atomicity the Redis scripts provide.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::types::UserId;
use authgate_entity::session::{Session, SessionTtls};

use super::store::{JtiRotation, SessionStore};

#[derive(Debug)]
struct Expiring<T> {
    value: T,
    deadline: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl_seconds: i64) -> Self {
        Self {
            value,
            deadline: deadline_after(ttl_seconds),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

#[derive(Debug, Default)]
struct State {
    sessions: HashMap<String, Expiring<Session>>,
    pointers: HashMap<String, Expiring<String>>,
    indexes: HashMap<UserId, Expiring<BTreeSet<String>>>,
}

impl State {
    fn live_session(&mut self, session_id: &str, now: Instant) -> Option<&mut Session> {
        if self
            .sessions
            .get(session_id)
            .is_some_and(|entry| !entry.is_live(now))
        {
            self.sessions.remove(session_id);
        }
        self.sessions.get_mut(session_id).map(|entry| &mut entry.value)
    }

    fn take_pointer(&mut self, jti: &str, now: Instant) -> Option<String> {
        self.pointers
            .remove(jti)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
    }

    fn live_index(&mut self, user_id: UserId, now: Instant) -> Option<&mut BTreeSet<String>> {
        if self
            .indexes
            .get(&user_id)
            .is_some_and(|entry| !entry.is_live(now))
        {
            self.indexes.remove(&user_id);
        }
        self.indexes.get_mut(&user_id).map(|entry| &mut entry.value)
    }

    /// Add `session_id` to the index and raise its TTL to at least `ttl_seconds`.
    fn index_with_floor(&mut self, user_id: UserId, session_id: &str, ttl_seconds: i64, now: Instant) {
        let floor = deadline_after(ttl_seconds);
        let live = self
            .indexes
            .get(&user_id)
            .is_some_and(|entry| entry.is_live(now));
        let entry = self.indexes.entry(user_id).or_insert_with(|| Expiring {
            value: BTreeSet::new(),
            deadline: floor,
        });
        if !live {
            entry.value.clear();
        }
        entry.value.insert(session_id.to_string());
        entry.deadline = entry.deadline.max(floor);
    }

    fn raise_index_floor(&mut self, user_id: UserId, ttl_seconds: i64, now: Instant) {
        let floor = deadline_after(ttl_seconds);
        if let Some(entry) = self.indexes.get_mut(&user_id).filter(|e| e.is_live(now)) {
            entry.deadline = entry.deadline.max(floor);
        }
    }
}

fn deadline_after(ttl_seconds: i64) -> Instant {
    Instant::now() + Duration::from_secs(ttl_seconds.max(0) as u64)
}

/// [`SessionStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Mutex<State>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw index size for `user_id`, including entries whose record expired.
    pub async fn index_len(&self, user_id: UserId) -> usize {
        let mut state = self.state.lock().await;
        state
            .live_index(user_id, Instant::now())
            .map_or(0, |index| index.len())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session, ttls: SessionTtls) -> AppResult<()> {
        if !ttls.is_valid() {
            return Err(AppError::invalid_input("session and JTI TTLs must be positive"));
        }

        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.sessions.insert(
            session.id.clone(),
            Expiring::new(session.clone(), ttls.session_ttl_seconds),
        );
        state.pointers.insert(
            session.current_jti.clone(),
            Expiring::new(session.id.clone(), ttls.jti_ttl_seconds),
        );
        state.index_with_floor(session.user_id, &session.id, ttls.session_ttl_seconds, now);
        Ok(())
    }

    async fn rotate_jti(&self, rotation: &JtiRotation) -> AppResult<String> {
        if !rotation.ttls.is_valid() {
            return Err(AppError::invalid_input("session and JTI TTLs must be positive"));
        }

        let now = Instant::now();
        let mut state = self.state.lock().await;
        let rejected = || AppError::unauthorized("Refresh token is invalid, expired, or already used");

        let session_id = state.take_pointer(&rotation.old_jti, now).ok_or_else(rejected)?;
        let session = state.live_session(&session_id, now).ok_or_else(rejected)?;

        session.current_jti = rotation.new_jti.clone();
        session.ip = rotation.ip.clone();
        session.device = rotation.device.clone();
        session.updated_at = rotation.updated_at;
        session.expires_at = rotation.expires_at;
        let user_id = session.user_id;

        if let Some(entry) = state.sessions.get_mut(&session_id) {
            entry.deadline = deadline_after(rotation.ttls.session_ttl_seconds);
        }
        state.pointers.insert(
            rotation.new_jti.clone(),
            Expiring::new(session_id.clone(), rotation.ttls.jti_ttl_seconds),
        );
        state.raise_index_floor(user_id, rotation.ttls.session_ttl_seconds, now);

        Ok(session_id)
    }

    async fn exists_jti(&self, jti: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        let now = Instant::now();
        Ok(state.pointers.get(jti).is_some_and(|entry| entry.is_live(now)))
    }

    async fn get(&self, session_id: &str) -> AppResult<Option<Session>> {
        let mut state = self.state.lock().await;
        Ok(state.live_session(session_id, Instant::now()).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let ids: Vec<String> = state
            .live_index(user_id, now)
            .map(|index| index.iter().cloned().collect())
            .unwrap_or_default();

        Ok(ids
            .iter()
            .filter_map(|id| state.live_session(id, now).cloned())
            .collect())
    }

    async fn delete(&self, session_ids: &[String]) -> AppResult<u64> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let mut removed = 0;

        for id in session_ids {
            let Some(entry) = state.sessions.remove(id) else {
                continue;
            };
            let session = entry.value;
            if let Some(index) = state.live_index(session.user_id, now) {
                index.remove(id);
            }
            state.pointers.remove(&session.current_jti);
            if entry.deadline > now {
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn sweep_user_index(&self, user_id: UserId) -> AppResult<u64> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        let Some(ids) = state
            .live_index(user_id, now)
            .map(|index| index.iter().cloned().collect::<Vec<_>>())
        else {
            return Ok(0);
        };

        let dead: Vec<String> = ids
            .into_iter()
            .filter(|id| state.live_session(id, now).is_none())
            .collect();
        if let Some(index) = state.live_index(user_id, now) {
            for id in &dead {
                index.remove(id);
            }
        }
        Ok(dead.len() as u64)
    }

    async fn sweep_all(&self) -> AppResult<u64> {
        let users: Vec<UserId> = self.state.lock().await.indexes.keys().copied().collect();
        let mut removed = 0;
        for user_id in users {
            removed += self.sweep_user_index(user_id).await?;
        }
        Ok(removed)
    }
}
