//! Repository traits and their PostgreSQL implementations.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod permission;
pub mod user;

use async_trait::async_trait;

use authgate_core::result::AppResult;
use authgate_core::types::{PageRequest, PageResponse, UserId};
use authgate_entity::permission::Permission;
use authgate_entity::user::{CreateUser, User, UserFilter, UserRole, UserStatus};

pub use permission::PgPermissionRepository;
pub use user::PgUserRepository;

/// Source of truth for user records.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Find a user by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user. `Conflict` if the email is already taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Users matching `filter`, newest first.
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AppResult<PageResponse<User>>;

    /// Replace a user's password hash. Returns `false` if the user does not exist.
    async fn update_password(&self, id: UserId, password_hash: &str) -> AppResult<bool>;

    /// Change a user's role. Returns `false` if the user does not exist.
    async fn update_role(&self, id: UserId, role: UserRole) -> AppResult<bool>;

    /// Change a user's status. Returns `false` if the user does not exist.
    async fn update_status(&self, id: UserId, status: UserStatus) -> AppResult<bool>;

    /// Delete a user. Returns `false` if the user does not exist.
    async fn delete(&self, id: UserId) -> AppResult<bool>;
}

/// Source of truth for role permission grants.
#[async_trait]
pub trait PermissionRepository: Send + Sync + 'static {
    /// All permissions granted to `role`, sorted.
    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<Permission>>;

    /// Grant `permission` to `role`. Returns `false` if already granted.
    async fn grant(&self, role: UserRole, permission: &Permission) -> AppResult<bool>;

    /// Revoke `permission` from `role`. Returns `false` if it was not granted.
    async fn revoke(&self, role: UserRole, permission: &Permission) -> AppResult<bool>;
}
