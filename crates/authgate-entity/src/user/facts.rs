//! Cached authorization facts for a user.

use serde::{Deserialize, Serialize};

use super::role::UserRole;
use super::status::UserStatus;

/// Current role and status of a user, as served from the authorization cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacts {
    /// The user's role.
    pub role: UserRole,
    /// The user's account status.
    pub status: UserStatus,
}
