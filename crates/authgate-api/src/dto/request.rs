//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use authgate_core::error::AppError;
use authgate_core::types::PageRequest;
use authgate_entity::user::{UserFilter, UserRole, UserStatus};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
    /// Device label. Falls back to the User-Agent header.
    #[validate(length(max = 256))]
    pub device: Option<String>,
}

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Account email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password. Strength is checked by the password policy.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
}

/// Password change request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// The password being replaced.
    #[validate(length(min = 1, max = 1024, message = "Current password is required"))]
    pub current_password: String,
    /// The replacement.
    #[validate(length(min = 1, max = 1024, message = "New password is required"))]
    pub new_password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
    /// Device label. Falls back to the User-Agent header.
    #[validate(length(max = 256))]
    pub device: Option<String>,
}

/// Session revocation request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RevokeSessionsRequest {
    /// Session ids to revoke.
    #[serde(default)]
    #[validate(length(max = 100, message = "At most 100 sessions per request"))]
    pub session_ids: Vec<String>,
    /// Revoke every session except the current one.
    #[serde(default)]
    pub remove_others: bool,
}

/// Role change request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    /// `client`, `operator`, or `admin`.
    #[validate(length(min = 1))]
    pub role: String,
}

/// Status change request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    /// `inactive`, `active`, or `suspended`.
    #[validate(length(min = 1))]
    pub status: String,
}

/// Permission grant request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GrantPermissionRequest {
    /// `resource:action` or `full_access`.
    #[validate(length(min = 1, max = 128))]
    pub permission: String,
}

/// Account creation request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Account email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Initial password.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
    /// `client`, `operator`, or `admin`.
    #[validate(length(min = 1))]
    pub role: String,
    /// Initial status. Defaults to `active`.
    pub status: Option<String>,
}

/// Query string of `GET /api/admin/users`.
///
/// `role` and `status` take comma-separated lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListQuery {
    /// Page number (1-based, default: 1).
    pub page: Option<u64>,
    /// Items per page (default: 25, max: 100).
    pub page_size: Option<u64>,
    /// Email substring.
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl UserListQuery {
    /// Clamped page request.
    pub fn page_request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(default.page),
            self.page_size.unwrap_or(default.page_size),
        )
    }

    /// Parsed filter. Unknown roles or statuses are `InvalidInput`.
    pub fn filter(&self) -> Result<UserFilter, AppError> {
        Ok(UserFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            roles: parse_list::<UserRole>(self.role.as_deref())?,
            statuses: parse_list::<UserStatus>(self.status.as_deref())?,
        })
    }
}

fn parse_list<T>(raw: Option<&str>) -> Result<Vec<T>, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<T>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_query_defaults() {
        let query = UserListQuery::default();
        assert_eq!(query.page_request(), PageRequest::default());
        assert_eq!(query.filter().unwrap(), UserFilter::default());
    }

    #[test]
    fn test_user_list_query_parses_lists() {
        let query = UserListQuery {
            page: Some(0),
            page_size: Some(500),
            search: Some("  ".to_string()),
            role: Some("client, operator".to_string()),
            status: Some("active".to_string()),
        };
        let page = query.page_request();
        assert_eq!((page.page, page.page_size), (1, 100));

        let filter = query.filter().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.roles, vec![UserRole::Client, UserRole::Operator]);
        assert_eq!(filter.statuses, vec![UserStatus::Active]);
    }

    #[test]
    fn test_user_list_query_rejects_unknown_role() {
        let query = UserListQuery {
            role: Some("root".to_string()),
            ..UserListQuery::default()
        };
        assert!(query.filter().is_err());
    }
}
