//! JWT claims carried by access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use authgate_core::types::UserId;

/// `iss` of every token this process mints.
pub const ISSUER: &str = "authgate";

/// `aud` entry every token must carry.
pub const AUDIENCE: &str = "api";

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token presented on every request.
    Access,
    /// Longer-lived token exchanged for a new pair.
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token acts for.
    pub user_id: UserId,
    /// Session the access token is bound to. Empty on refresh tokens.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    /// Access or refresh.
    pub token_type: TokenType,
    /// Token identifier. For refresh tokens this is the session's `current_jti`.
    pub jti: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: Vec<String>,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Not-before (unix seconds).
    pub nbf: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Seconds until expiry, zero once expired.
    pub fn remaining_ttl_seconds(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}
