//! The authenticated caller.

use serde::{Deserialize, Serialize};

use authgate_core::types::UserId;
use authgate_entity::user::UserRole;

/// Who is making the request, resolved from a valid access token.
///
/// Only produced by [`crate::AuthService::authenticate`], after the session
/// and account status have been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// The authenticated user.
    pub user_id: UserId,
    /// Session the access token is bound to.
    pub session_id: String,
    /// JTI of the access token itself.
    pub jti: String,
    /// Role at authentication time.
    pub role: UserRole,
}
