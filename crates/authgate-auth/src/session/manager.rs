//! Session lifecycle on top of a [`SessionStore`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use authgate_core::config::SessionConfig;
use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;
use authgate_core::traits::IdGenerator;
use authgate_core::types::UserId;
use authgate_entity::session::{Session, SessionTtls, SessionView};

use super::store::{JtiRotation, SessionStore};

/// Upper bound on a session lifetime (ten years).
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// Input of [`SessionManager::create_session`].
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Owner.
    pub user_id: UserId,
    /// JTI of the refresh token issued with this login.
    pub jti: String,
    /// Expiry of that refresh token; bounds the JTI pointer lifetime.
    pub jti_expires_at: DateTime<Utc>,
    /// Client IP.
    pub ip: String,
    /// Device label.
    pub device: String,
}

/// Input of [`SessionManager::rotate_session_jti`].
#[derive(Debug, Clone)]
pub struct SessionRotation {
    /// JTI of the presented refresh token.
    pub old_jti: String,
    /// JTI of the refresh token about to be returned.
    pub new_jti: String,
    /// Expiry of the new refresh token.
    pub jti_expires_at: DateTime<Utc>,
    /// Client IP of the refresh request.
    pub ip: String,
    /// Device label of the refresh request.
    pub device: String,
}

/// Input of [`SessionManager::delete_sessions`].
#[derive(Debug, Clone, Default)]
pub struct SessionDeletion {
    /// The user whose sessions are targeted.
    pub user_id: UserId,
    /// Session making the request. Kept when `remove_others` is set.
    pub current_session_id: String,
    /// Explicit targets. Ids owned by other users are ignored.
    pub target_ids: Vec<String>,
    /// Delete every session of the user except the current one.
    pub remove_others: bool,
}

/// Creates, rotates, lists, and deletes sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ids: Arc<dyn IdGenerator>,
    session_ttl: Duration,
}

impl SessionManager {
    /// Create a manager over `store`.
    pub fn new(store: Arc<dyn SessionStore>, ids: Arc<dyn IdGenerator>, config: &SessionConfig) -> Self {
        Self {
            store,
            ids,
            session_ttl: config.session_ttl(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Fresh identifier for a session or token.
    pub fn next_id(&self) -> String {
        self.ids.next_id()
    }

    /// Configured session lifetime.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Persist a new session and return its id.
    pub async fn create_session(&self, input: NewSession) -> AppResult<String> {
        if input.jti.is_empty() {
            return Err(AppError::invalid_input("session requires a refresh token id"));
        }

        let now = Utc::now();
        let (ttls, expires_at) = self.ttls(input.jti_expires_at, now)?;
        let session = Session {
            id: self.ids.next_id(),
            user_id: input.user_id,
            device: input.device,
            ip: input.ip,
            current_jti: input.jti,
            created_at: now,
            updated_at: now,
            expires_at,
        };

        self.store.create(&session, ttls).await?;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            device = %session.device,
            ip = %session.ip,
            "Session created"
        );
        Ok(session.id)
    }

    /// Consume `old_jti` and make `new_jti` the session's current JTI.
    ///
    /// Returns the session id. A reused, expired, or unknown JTI is
    /// `Unauthorized` and leaves the store unchanged.
    pub async fn rotate_session_jti(&self, input: SessionRotation) -> AppResult<String> {
        if input.old_jti.is_empty() || input.new_jti.is_empty() {
            return Err(AppError::invalid_input("both JTIs are required for rotation"));
        }

        let now = Utc::now();
        let (ttls, expires_at) = self.ttls(input.jti_expires_at, now)?;
        let rotation = JtiRotation {
            old_jti: input.old_jti,
            new_jti: input.new_jti,
            ip: input.ip,
            device: input.device,
            updated_at: now,
            expires_at,
            ttls,
        };

        match self.store.rotate_jti(&rotation).await {
            Ok(session_id) => {
                info!(session_id = %session_id, ip = %rotation.ip, "Session JTI rotated");
                Ok(session_id)
            }
            Err(e) if e.is(ErrorKind::Unauthorized) => {
                warn!(ip = %rotation.ip, device = %rotation.device, "Refresh token rejected: reused, expired, or unknown");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `jti` is the current JTI of some live session.
    pub async fn is_jti_valid(&self, jti: &str) -> AppResult<bool> {
        if jti.is_empty() {
            return Ok(false);
        }
        self.store.exists_jti(jti).await
    }

    /// Load one session.
    pub async fn get_session(&self, session_id: &str) -> AppResult<Option<Session>> {
        self.store.get(session_id).await
    }

    /// Whether `session_id` is live, owned by `user_id`, and still holds a
    /// valid refresh JTI. Checked on every authenticated request.
    pub async fn is_session_active(&self, user_id: UserId, session_id: &str) -> AppResult<bool> {
        match self.store.get(session_id).await? {
            Some(session) if session.user_id == user_id => {
                self.is_jti_valid(&session.current_jti).await
            }
            _ => Ok(false),
        }
    }

    /// Live sessions of `user_id`, most recently used first, with
    /// `current_session_id` flagged.
    pub async fn get_sessions_by_user(
        &self,
        user_id: UserId,
        current_session_id: &str,
    ) -> AppResult<Vec<SessionView>> {
        let mut sessions = self.store.list_by_user(user_id).await?;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(sessions
            .iter()
            .map(|session| session.view(current_session_id))
            .collect())
    }

    /// Delete sessions of one user. Returns how many were removed.
    ///
    /// A request that resolves to no targets is a no-op.
    pub async fn delete_sessions(&self, request: SessionDeletion) -> AppResult<u64> {
        let owned: Vec<String> = self
            .store
            .list_by_user(request.user_id)
            .await?
            .into_iter()
            .map(|session| session.id)
            .collect();

        let targets: Vec<String> = if request.remove_others {
            owned
                .into_iter()
                .filter(|id| *id != request.current_session_id)
                .collect()
        } else {
            request
                .target_ids
                .iter()
                .filter(|id| owned.contains(id))
                .cloned()
                .collect()
        };

        if targets.len() < request.target_ids.len() && !request.remove_others {
            debug!(
                user_id = %request.user_id,
                ignored = request.target_ids.len() - targets.len(),
                "Ignored session ids not owned by the user"
            );
        }
        self.delete_by_id(request.user_id, &targets).await
    }

    /// Delete every session of `user_id`.
    pub async fn delete_all_for_user(&self, user_id: UserId) -> AppResult<u64> {
        let ids: Vec<String> = self
            .store
            .list_by_user(user_id)
            .await?
            .into_iter()
            .map(|session| session.id)
            .collect();
        let removed = self.delete_by_id(user_id, &ids).await?;
        self.store.sweep_user_index(user_id).await?;
        Ok(removed)
    }

    async fn delete_by_id(&self, user_id: UserId, session_ids: &[String]) -> AppResult<u64> {
        if session_ids.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete(session_ids).await?;
        info!(user_id = %user_id, requested = session_ids.len(), removed, "Sessions deleted");
        Ok(removed)
    }

    /// TTLs for a write at `now`, plus the resulting session expiry.
    fn ttls(&self, jti_expires_at: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<(SessionTtls, DateTime<Utc>)> {
        if self.session_ttl > MAX_SESSION_TTL {
            return Err(AppError::invalid_input(format!(
                "session TTL of {}s exceeds the {}s maximum",
                self.session_ttl.as_secs(),
                MAX_SESSION_TTL.as_secs()
            )));
        }
        let lifetime = chrono::Duration::from_std(self.session_ttl)
            .map_err(|e| AppError::invalid_input(format!("session TTL out of range: {e}")))?;
        let ttls = SessionTtls {
            session_ttl_seconds: lifetime.num_seconds(),
            jti_ttl_seconds: (jti_expires_at - now).num_seconds(),
        };
        if !ttls.is_valid() {
            return Err(AppError::invalid_input(format!(
                "session and JTI TTLs must be positive (session {}s, jti {}s)",
                ttls.session_ttl_seconds, ttls.jti_ttl_seconds
            )));
        }
        Ok((ttls, now + lifetime))
    }
}
