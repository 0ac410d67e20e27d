//! Request handlers, one module per route group.

pub mod admin;
pub mod auth;
pub mod health;
pub mod sessions;

use authgate_core::error::AppError;
use authgate_core::types::UserId;
use authgate_entity::user::UserRole;

/// Parse a `{id}` path segment.
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::invalid_input(format!("Invalid user id: '{raw}'")))
}

/// Parse a `{role}` path segment.
pub(crate) fn parse_role(raw: &str) -> Result<UserRole, AppError> {
    raw.parse()
}
