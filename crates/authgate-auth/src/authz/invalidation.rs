//! Invalidation bus handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use authgate_core::error::AppError;
use authgate_core::events::{EventKind, InvalidationBusBuilder, InvalidationEvent, InvalidationHandler};
use authgate_core::result::AppResult;
use authgate_entity::user::UserRole;

use crate::session::SessionManager;

use super::cache::AuthzCache;

/// Evicts cached user facts on `UserChanged` and `UserDeleted`.
#[derive(Debug)]
pub struct UserFactsInvalidator {
    cache: Arc<AuthzCache>,
}

impl UserFactsInvalidator {
    /// Create an invalidator over the shared authorization cache.
    pub fn new(cache: Arc<AuthzCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl InvalidationHandler for UserFactsInvalidator {
    fn name(&self) -> &str {
        "user_facts_invalidator"
    }

    async fn handle(&self, event: &InvalidationEvent) -> AppResult<()> {
        match event {
            InvalidationEvent::UserChanged { user_id } | InvalidationEvent::UserDeleted { user_id } => {
                self.cache.clear_user(*user_id).await;
            }
            InvalidationEvent::RoleChanged { .. } => {}
        }
        Ok(())
    }
}

/// Evicts a cached role permission set on `RoleChanged`.
#[derive(Debug)]
pub struct RolePermissionsInvalidator {
    cache: Arc<AuthzCache>,
}

impl RolePermissionsInvalidator {
    /// Create an invalidator over the shared authorization cache.
    pub fn new(cache: Arc<AuthzCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl InvalidationHandler for RolePermissionsInvalidator {
    fn name(&self) -> &str {
        "role_permissions_invalidator"
    }

    async fn handle(&self, event: &InvalidationEvent) -> AppResult<()> {
        if let InvalidationEvent::RoleChanged { role } = event {
            let role: UserRole = role
                .parse()
                .map_err(|_| AppError::invalid_input(format!("Unknown role in event: {role}")))?;
            self.cache.clear_role(role).await;
        }
        Ok(())
    }
}

/// Deletes every session of a user on `UserDeleted`.
#[derive(Debug)]
pub struct SessionRevoker {
    sessions: Arc<SessionManager>,
}

impl SessionRevoker {
    /// Create a revoker that deletes sessions through `sessions`.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl InvalidationHandler for SessionRevoker {
    fn name(&self) -> &str {
        "session_revoker"
    }

    async fn handle(&self, event: &InvalidationEvent) -> AppResult<()> {
        if let InvalidationEvent::UserDeleted { user_id } = event {
            let removed = self.sessions.delete_all_for_user(*user_id).await?;
            info!(user_id = %user_id, removed, "Revoked sessions of deleted user");
        }
        Ok(())
    }
}

/// Register the standard handlers on `builder`.
pub fn register_handlers(
    builder: InvalidationBusBuilder,
    cache: Arc<AuthzCache>,
    sessions: Arc<SessionManager>,
) -> InvalidationBusBuilder {
    let user_facts: Arc<dyn InvalidationHandler> = Arc::new(UserFactsInvalidator::new(cache.clone()));
    builder
        .register(EventKind::UserChanged, user_facts.clone())
        .register(EventKind::UserDeleted, user_facts)
        .register(EventKind::RoleChanged, Arc::new(RolePermissionsInvalidator::new(cache)))
        .register(EventKind::UserDeleted, Arc::new(SessionRevoker::new(sessions)))
}
