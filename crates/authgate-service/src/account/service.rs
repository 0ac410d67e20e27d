//! Registration and password change.
//!
//! A password change revokes every session of the account, including the
//! one that made the request, so stolen refresh tokens die with the old
//! password.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use authgate_auth::{AuthzCache, PasswordHasher, PasswordPolicy, SessionManager};
use authgate_core::error::AppError;
use authgate_core::events::{InvalidationBus, InvalidationEvent};
use authgate_core::result::AppResult;
use authgate_database::repositories::UserRepository;
use authgate_entity::user::{CreateUser, User, UserRole, UserStatus};

use crate::context::AuthContext;

/// A signup request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

/// A password change by the account owner.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Account creation and credential changes by the account owner.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<PasswordHasher>,
    policy: Arc<PasswordPolicy>,
    sessions: Arc<SessionManager>,
    cache: Arc<AuthzCache>,
    bus: InvalidationBus,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("policy", &self.policy)
            .finish()
    }
}

impl AccountService {
    /// Create the service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<PasswordHasher>,
        policy: Arc<PasswordPolicy>,
        sessions: Arc<SessionManager>,
        cache: Arc<AuthzCache>,
        bus: InvalidationBus,
    ) -> Self {
        Self {
            users,
            hasher,
            policy,
            sessions,
            cache,
            bus,
        }
    }

    /// Create a `client` account in the `inactive` state.
    ///
    /// The account cannot log in until an administrator activates it.
    /// `Conflict` if the email is taken.
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
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
                role: UserRole::Client,
                status: UserStatus::Inactive,
            })
            .await?;
        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Replace the caller's password and revoke all of their sessions.
    ///
    /// Returns the number of sessions revoked. A wrong current password is
    /// `InvalidInput`, so it cannot be confused with an expired token.
    pub async fn change_password(&self, ctx: &AuthContext, input: ChangePasswordInput) -> AppResult<u64> {
        self.policy
            .validate_not_same(&input.current_password, &input.new_password)?;

        let user = self
            .users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !self.hasher.verify(&input.current_password, &user.password_hash)? {
            info!(user_id = %user.id, "Password change rejected: wrong current password");
            return Err(AppError::invalid_input("Current password is incorrect"));
        }
        self.policy.validate(&input.new_password, &[&user.email])?;

        let hash = self.hasher.hash(&input.new_password)?;
        if !self.users.update_password(user.id, &hash).await? {
            return Err(AppError::not_found("User not found"));
        }

        let revoked = self.sessions.delete_all_for_user(user.id).await?;
        self.cache.clear_user(user.id).await;
        self.bus.publish(InvalidationEvent::UserChanged { user_id: user.id });
        info!(user_id = %user.id, revoked, "Password changed, sessions revoked");
        Ok(revoked)
    }
}
