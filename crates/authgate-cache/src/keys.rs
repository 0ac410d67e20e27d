//! Key builders for every Redis and cache entry AuthGate writes.
//!
//! Keys are returned without the deployment prefix; the provider or
//! session store prepends it.

use std::fmt::Display;

// ── Session keys ───────────────────────────────────────────

/// Hash holding one session record.
pub fn session_hash(session_id: &str) -> String {
    format!("session:id:{session_id}")
}

/// Pointer from a refresh JTI to its session hash key.
pub fn jti_pointer(jti: &str) -> String {
    format!("session:jti:{jti}")
}

/// Set of session hash keys owned by a user.
pub fn user_sessions(user_id: impl Display) -> String {
    format!("session:user:{user_id}")
}

/// Pattern matching every user session index, for the sweeper.
pub fn user_sessions_pattern() -> &'static str {
    "session:user:*"
}

// ── Authorization keys ─────────────────────────────────────

/// Cached `{role, status}` of a user.
pub fn user_facts(user_id: impl Display) -> String {
    format!("authz:user:{user_id}")
}

/// Cached permission set of a role.
pub fn role_permissions(role: impl Display) -> String {
    format!("authz:role:{role}")
}
