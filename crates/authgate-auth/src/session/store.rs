//! Session store abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use authgate_core::result::AppResult;
use authgate_core::types::UserId;
use authgate_entity::session::{Session, SessionTtls};

/// Arguments of a single-use JTI rotation.
#[derive(Debug, Clone)]
pub struct JtiRotation {
    /// JTI presented by the client. Consumed by a successful rotation.
    pub old_jti: String,
    /// JTI of the freshly issued refresh token.
    pub new_jti: String,
    /// Client IP of the refresh request.
    pub ip: String,
    /// Device label of the refresh request.
    pub device: String,
    /// Rotation time, stored as `updated_at`.
    pub updated_at: DateTime<Utc>,
    /// New absolute session expiry.
    pub expires_at: DateTime<Utc>,
    /// TTLs re-armed on the record, the new pointer, and the index.
    pub ttls: SessionTtls,
}

/// Persistence for session records, JTI pointers, and user indexes.
///
/// `create`, `rotate_jti`, and `delete` are each atomic with respect to
/// every other operation. Nothing is retried.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Write the record, its JTI pointer, and its index membership.
    ///
    /// Fails with `InvalidInput` unless both TTLs are positive. The index
    /// TTL is raised to the session TTL and never lowered.
    async fn create(&self, session: &Session, ttls: SessionTtls) -> AppResult<()>;

    /// Consume `old_jti` and point `new_jti` at the same session.
    ///
    /// At most one concurrent caller presenting the same `old_jti`
    /// succeeds. All others get `Unauthorized`. Returns the session id.
    async fn rotate_jti(&self, rotation: &JtiRotation) -> AppResult<String>;

    /// Whether a pointer for `jti` exists right now.
    async fn exists_jti(&self, jti: &str) -> AppResult<bool>;

    /// Load one session record.
    async fn get(&self, session_id: &str) -> AppResult<Option<Session>>;

    /// Every live session of `user_id`, in no particular order.
    ///
    /// Index entries whose record has expired are skipped, not removed.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Session>>;

    /// Remove each record with its current pointer and index membership.
    ///
    /// Unknown ids are ignored. Returns how many records were removed.
    async fn delete(&self, session_ids: &[String]) -> AppResult<u64>;

    /// Drop index entries of `user_id` whose record no longer exists.
    async fn sweep_user_index(&self, user_id: UserId) -> AppResult<u64>;

    /// Sweep every user index. Returns the number of entries dropped.
    async fn sweep_all(&self) -> AppResult<u64>;
}
