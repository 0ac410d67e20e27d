//! Role permission grants.

use std::sync::Arc;

use tracing::info;

use authgate_auth::{AuthzCache, Authorizer};
use authgate_core::events::{InvalidationBus, InvalidationEvent};
use authgate_core::result::AppResult;
use authgate_database::repositories::PermissionRepository;
use authgate_entity::permission::{Permission, known};
use authgate_entity::user::UserRole;

use crate::context::AuthContext;

/// Administrative management of role permission sets.
#[derive(Clone)]
pub struct RoleAdminService {
    permissions: Arc<dyn PermissionRepository>,
    authorizer: Arc<Authorizer>,
    cache: Arc<AuthzCache>,
    bus: InvalidationBus,
}

impl std::fmt::Debug for RoleAdminService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAdminService").finish()
    }
}

impl RoleAdminService {
    /// Create the service.
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        authorizer: Arc<Authorizer>,
        bus: InvalidationBus,
    ) -> Self {
        Self {
            cache: Arc::clone(authorizer.cache()),
            permissions,
            authorizer,
            bus,
        }
    }

    /// Current permission set of `role`.
    pub async fn list(&self, ctx: &AuthContext, role: UserRole) -> AppResult<Vec<Permission>> {
        self.require_manage(ctx).await?;
        self.cache.get_role_permissions(role).await
    }

    /// Grant `permission` to `role`. Returns `false` if it was already granted.
    pub async fn grant(&self, ctx: &AuthContext, role: UserRole, permission: Permission) -> AppResult<bool> {
        self.require_manage(ctx).await?;
        let changed = self.permissions.grant(role, &permission).await?;
        if changed {
            self.invalidate(role).await;
            info!(actor = %ctx.user_id, role = %role, permission = %permission, "Permission granted");
        }
        Ok(changed)
    }

    /// Revoke `permission` from `role`. Returns `false` if it was not granted.
    pub async fn revoke(&self, ctx: &AuthContext, role: UserRole, permission: Permission) -> AppResult<bool> {
        self.require_manage(ctx).await?;
        let changed = self.permissions.revoke(role, &permission).await?;
        if changed {
            self.invalidate(role).await;
            info!(actor = %ctx.user_id, role = %role, permission = %permission, "Permission revoked");
        }
        Ok(changed)
    }

    async fn require_manage(&self, ctx: &AuthContext) -> AppResult<()> {
        self.authorizer
            .authorize(ctx.user_id, &Permission::known(known::ROLE_MANAGE))
            .await
            .map(|_| ())
    }

    async fn invalidate(&self, role: UserRole) {
        self.cache.clear_role(role).await;
        self.bus.publish(InvalidationEvent::RoleChanged {
            role: role.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use authgate_core::error::ErrorKind;

    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_revoked_permission_is_denied_on_next_check() {
        let h = Harness::new().await;
        h.add_user("root@example.com", UserRole::Admin).await;
        h.add_user("u1@example.com", UserRole::Client).await;
        let admin = h.login_ctx("root@example.com").await;
        let user = h.login_ctx("u1@example.com").await;

        h.session_service.list(&user).await.unwrap();

        let read = Permission::known(known::SESSION_READ);
        assert!(h.role_admin.revoke(&admin, UserRole::Client, read.clone()).await.unwrap());
        assert!(!h.role_admin.revoke(&admin, UserRole::Client, read.clone()).await.unwrap());

        let err = h.session_service.list(&user).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        assert!(h.role_admin.grant(&admin, UserRole::Client, read).await.unwrap());
        h.session_service.list(&user).await.unwrap();
    }

    #[tokio::test]
    async fn test_only_role_managers_can_edit_roles() {
        let h = Harness::new().await;
        h.add_user("op@example.com", UserRole::Operator).await;
        let op = h.login_ctx("op@example.com").await;

        let err = h
            .role_admin
            .grant(&op, UserRole::Operator, Permission::full_access())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
