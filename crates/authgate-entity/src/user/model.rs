//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use authgate_core::types::UserId;

use super::facts::UserFacts;
use super::role::UserRole;
use super::status::UserStatus;

/// A registered user. The relational store is the source of truth;
/// [`UserFacts`] is the cached projection used on the request path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login email address.
    pub email: String,
    /// Argon2 password hash (PHC string).
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Project the authorization-relevant fields.
    pub fn facts(&self) -> UserFacts {
        UserFacts {
            role: self.role,
            status: self.status,
        }
    }
}

/// Data for inserting a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login email address.
    pub email: String,
    /// Pre-hashed password (PHC string).
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
    /// Initial status.
    pub status: UserStatus,
}

/// Criteria for listing users. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive substring of the email.
    pub search: Option<String>,
    /// Allowed roles.
    pub roles: Vec<UserRole>,
    /// Allowed statuses.
    pub statuses: Vec<UserStatus>,
}

impl UserFilter {
    /// Whether `user` satisfies every criterion.
    pub fn matches(&self, user: &User) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => user
                .email
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        search_ok
            && (self.roles.is_empty() || self.roles.contains(&user.role))
            && (self.statuses.is_empty() || self.statuses.contains(&user.status))
    }
}
