//! User creation, listing, role, status, and deletion by administrators.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use authgate_auth::{AuthzCache, Authorizer, PasswordHasher, PasswordPolicy, SessionManager};
use authgate_core::error::AppError;
use authgate_core::events::{InvalidationBus, InvalidationEvent};
use authgate_core::result::AppResult;
use authgate_core::types::{PageRequest, PageResponse, UserId};
use authgate_database::repositories::UserRepository;
use authgate_entity::permission::{Permission, known};
use authgate_entity::user::{CreateUser, User, UserFilter, UserRole, UserStatus};

use crate::context::AuthContext;

/// An account created by an administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Administrative user management.
#[derive(Clone)]
pub struct UserAdminService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<PasswordHasher>,
    policy: Arc<PasswordPolicy>,
    authorizer: Arc<Authorizer>,
    cache: Arc<AuthzCache>,
    sessions: Arc<SessionManager>,
    bus: InvalidationBus,
}

impl std::fmt::Debug for UserAdminService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAdminService").finish()
    }
}

impl UserAdminService {
    /// Create the service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<PasswordHasher>,
        policy: Arc<PasswordPolicy>,
        authorizer: Arc<Authorizer>,
        sessions: Arc<SessionManager>,
        bus: InvalidationBus,
    ) -> Self {
        Self {
            cache: Arc::clone(authorizer.cache()),
            users,
            hasher,
            policy,
            authorizer,
            sessions,
            bus,
        }
    }

    /// Load a user.
    pub async fn get_user(&self, ctx: &AuthContext, user_id: UserId) -> AppResult<User> {
        self.require(ctx, known::USER_READ).await?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Create an account with an explicit role and status.
    pub async fn create_user(&self, ctx: &AuthContext, input: CreateUserInput) -> AppResult<User> {
        self.require(ctx, known::USER_WRITE).await?;
        let email = input.email.trim();
        if email.is_empty() {
            return Err(AppError::invalid_input("Email is required"));
        }
        self.policy.validate(&input.password, &[email])?;

        let user = self
            .users
            .create(&CreateUser {
                email: email.to_string(),
                password_hash: self.hasher.hash(&input.password)?,
                role: input.role,
                status: input.status,
            })
            .await?;
        info!(actor = %ctx.user_id, user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// One page of users matching `filter`, newest first.
    pub async fn list_users(
        &self,
        ctx: &AuthContext,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<User>> {
        self.require(ctx, known::USER_READ).await?;
        self.users.list(filter, page).await
    }

    /// Change a user's role.
    pub async fn change_role(&self, ctx: &AuthContext, user_id: UserId, role: UserRole) -> AppResult<()> {
        self.require(ctx, known::USER_CHANGE_ROLE).await?;
        if !self.users.update_role(user_id, role).await? {
            return Err(AppError::not_found("User not found"));
        }

        self.invalidate(InvalidationEvent::UserChanged { user_id }).await;
        info!(actor = %ctx.user_id, user_id = %user_id, role = %role, "User role changed");
        Ok(())
    }

    /// Change a user's status. Leaving `active` also revokes every session.
    pub async fn change_status(
        &self,
        ctx: &AuthContext,
        user_id: UserId,
        status: UserStatus,
    ) -> AppResult<()> {
        self.require(ctx, known::USER_CHANGE_STATUS).await?;
        if user_id == ctx.user_id && status != UserStatus::Active {
            return Err(AppError::invalid_input("Administrators cannot deactivate themselves"));
        }
        if !self.users.update_status(user_id, status).await? {
            return Err(AppError::not_found("User not found"));
        }

        self.invalidate(InvalidationEvent::UserChanged { user_id }).await;
        if !status.can_authenticate() {
            let revoked = self.sessions.delete_all_for_user(user_id).await?;
            info!(user_id = %user_id, revoked, "Sessions revoked after status change");
        }
        info!(actor = %ctx.user_id, user_id = %user_id, status = %status, "User status changed");
        Ok(())
    }

    /// Delete a user. Sessions are revoked by the bus handler.
    pub async fn delete_user(&self, ctx: &AuthContext, user_id: UserId) -> AppResult<()> {
        self.require(ctx, known::USER_DELETE).await?;
        if user_id == ctx.user_id {
            return Err(AppError::invalid_input("Administrators cannot delete themselves"));
        }
        if !self.users.delete(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }

        self.invalidate(InvalidationEvent::UserDeleted { user_id }).await;
        info!(actor = %ctx.user_id, user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn require(&self, ctx: &AuthContext, permission: &'static str) -> AppResult<()> {
        self.authorizer
            .authorize(ctx.user_id, &Permission::known(permission))
            .await
            .map(|_| ())
    }

    async fn invalidate(&self, event: InvalidationEvent) {
        if let InvalidationEvent::UserChanged { user_id } | InvalidationEvent::UserDeleted { user_id } = &event {
            self.cache.clear_user(*user_id).await;
        }
        self.bus.publish(event);
    }
}
