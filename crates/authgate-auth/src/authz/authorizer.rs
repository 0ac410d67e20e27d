//! Status and permission checks for authenticated users.

use std::sync::Arc;

use tracing::debug;

use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::types::UserId;
use authgate_entity::permission::Permission;
use authgate_entity::user::{UserFacts, UserStatus};

use super::cache::AuthzCache;

/// Answers "may this user do that" from the authorization cache.
#[derive(Debug, Clone)]
pub struct Authorizer {
    cache: Arc<AuthzCache>,
}

impl Authorizer {
    /// Create an authorizer over `cache`.
    pub fn new(cache: Arc<AuthzCache>) -> Self {
        Self { cache }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &Arc<AuthzCache> {
        &self.cache
    }

    /// Current facts of `user_id`, failing unless the account is active.
    ///
    /// A deleted user is reported as `Unauthorized`, not `NotFound`.
    pub async fn check_status(&self, user_id: UserId) -> AppResult<UserFacts> {
        let facts = match self.cache.get_user_facts(user_id).await {
            Ok(facts) => facts,
            Err(e) if e.is(authgate_core::error::ErrorKind::NotFound) => {
                return Err(AppError::unauthorized("Account no longer exists"));
            }
            Err(e) => return Err(e),
        };

        match facts.status {
            UserStatus::Active => Ok(facts),
            UserStatus::Inactive => Err(AppError::forbidden("Account is not activated")),
            UserStatus::Suspended => Err(AppError::forbidden("Account is suspended")),
        }
    }

    /// Require `required` for `user_id`. `full_access` grants everything.
    pub async fn authorize(&self, user_id: UserId, required: &Permission) -> AppResult<UserFacts> {
        let facts = self.check_status(user_id).await?;
        let granted = self.cache.get_role_permissions(facts.role).await?;

        if granted.iter().any(|p| p.grants(required)) {
            Ok(facts)
        } else {
            debug!(user_id = %user_id, role = %facts.role, permission = %required, "Permission denied");
            Err(AppError::forbidden(format!("Missing permission: {required}")))
        }
    }
}
