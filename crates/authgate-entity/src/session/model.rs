//! Session record and its client-facing view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use authgate_core::types::UserId;

/// One session per successful login.
///
/// Stored as a Redis hash with the fields `id, user_id, device, ip,
/// created_at, updated_at, expires_at, current_jti`. Timestamps are
/// persisted as unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque, never-reused session identifier.
    pub id: String,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// Device label from the login request. Advisory only.
    pub device: String,
    /// Client IP from the login request. Advisory only.
    pub ip: String,
    /// JTI of the refresh token currently authorized for this session.
    pub current_jti: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last rotation time.
    pub updated_at: DateTime<Utc>,
    /// Absolute expiry, pushed forward on every rotation.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Client-facing view, flagged when `id` equals `current_session_id`.
    pub fn view(&self, current_session_id: &str) -> SessionView {
        SessionView {
            id: self.id.clone(),
            device: self.device.clone(),
            ip: self.ip.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
            current: self.id == current_session_id,
        }
    }
}

/// TTLs used to (re)arm expiry on a session write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtls {
    /// Lifetime of the session hash and the floor for the user index.
    pub session_ttl_seconds: i64,
    /// Lifetime of the JTI pointer.
    pub jti_ttl_seconds: i64,
}

impl SessionTtls {
    /// Both TTLs must be strictly positive.
    pub fn is_valid(&self) -> bool {
        self.session_ttl_seconds > 0 && self.jti_ttl_seconds > 0
    }
}

/// A session as listed to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    /// Session identifier.
    pub id: String,
    /// Device label.
    pub device: String,
    /// Client IP.
    pub ip: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last rotation time.
    pub updated_at: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session making the request.
    pub current: bool,
}
