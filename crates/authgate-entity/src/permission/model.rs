//! Permission strings granted to roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wildcard permission that satisfies every check.
pub const FULL_ACCESS: &str = "full_access";

/// Permissions checked by the built-in routes.
pub mod known {
    pub const USER_READ: &str = "user:read";
    pub const USER_WRITE: &str = "user:write";
    pub const USER_DELETE: &str = "user:delete";
    pub const USER_CHANGE_ROLE: &str = "user:change_role";
    pub const USER_CHANGE_STATUS: &str = "user:change_status";
    pub const ROLE_MANAGE: &str = "role:manage";
    pub const SESSION_READ: &str = "session:read";
    pub const SESSION_REVOKE: &str = "session:revoke";
}

/// A permission such as `user:read` or `session:revoke`.
///
/// Permissions are lowercase ASCII, either the bare wildcard
/// [`FULL_ACCESS`] or `resource:action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// The wildcard permission.
    pub fn full_access() -> Self {
        Self(FULL_ACCESS.to_string())
    }

    /// Borrow the permission string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the wildcard.
    pub fn is_full_access(&self) -> bool {
        self.0 == FULL_ACCESS
    }

    /// Build a permission from one of the [`known`] constants.
    pub fn known(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Whether a holder of this permission satisfies `required`.
    pub fn grants(&self, required: &Permission) -> bool {
        self.is_full_access() || self == required
    }
}

fn valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl FromStr for Permission {
    type Err = authgate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ok = if s == FULL_ACCESS {
            true
        } else {
            match s.split_once(':') {
                Some((resource, action)) => valid_segment(resource) && valid_segment(action),
                None => false,
            }
        };
        if ok {
            Ok(Self(s.to_string()))
        } else {
            Err(authgate_core::AppError::invalid_input(format!(
                "Invalid permission: '{s}'. Expected 'resource:action' or '{FULL_ACCESS}'"
            )))
        }
    }
}

impl TryFrom<String> for Permission {
    type Error = authgate_core::AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
