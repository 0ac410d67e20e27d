//! Read-through caches for user facts and role permissions.
//!
//! Reads try the cache first and fall back to the repository on a miss or
//! on any cache failure. Fills and evictions are best-effort: their
//! failures are logged and never fail the caller, since the next read
//! simply goes to the repository again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use authgate_cache::CacheManager;
use authgate_cache::keys;
use authgate_core::config::CacheConfig;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::traits::CacheProvider;
use authgate_core::types::UserId;
use authgate_database::repositories::{PermissionRepository, UserRepository};
use authgate_entity::permission::Permission;
use authgate_entity::user::{UserFacts, UserRole};

/// Authorization cache over the user and permission repositories.
#[derive(Clone)]
pub struct AuthzCache {
    cache: Arc<CacheManager>,
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
    user_facts_ttl: Duration,
    role_permissions_ttl: Duration,
}

impl std::fmt::Debug for AuthzCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthzCache")
            .field("user_facts_ttl", &self.user_facts_ttl)
            .field("role_permissions_ttl", &self.role_permissions_ttl)
            .finish()
    }
}

impl AuthzCache {
    /// Create the cache with TTLs from configuration.
    pub fn new(
        cache: Arc<CacheManager>,
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            cache,
            users,
            permissions,
            user_facts_ttl: config.user_facts_ttl(),
            role_permissions_ttl: config.role_permissions_ttl(),
        }
    }

    /// Role and status of `user_id`.
    ///
    /// `NotFound` when the user does not exist.
    pub async fn get_user_facts(&self, user_id: UserId) -> AppResult<UserFacts> {
        let key = keys::user_facts(user_id);
        match self.cache.get_json::<UserFacts>(&key).await {
            Ok(Some(facts)) => return Ok(facts),
            Ok(None) => {}
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "User facts cache read failed, using repository");
            }
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        let facts = user.facts();

        best_effort("fill user facts", &key, self.cache.set_json(&key, &facts, self.user_facts_ttl)).await;
        debug!(user_id = %user_id, "User facts loaded from repository");
        Ok(facts)
    }

    /// Permission set granted to `role`. Possibly empty.
    pub async fn get_role_permissions(&self, role: UserRole) -> AppResult<Vec<Permission>> {
        let key = keys::role_permissions(role);
        match self.cache.get_json::<Vec<Permission>>(&key).await {
            Ok(Some(permissions)) => return Ok(permissions),
            Ok(None) => {}
            Err(e) => {
                warn!(role = %role, error = %e, "Role permissions cache read failed, using repository");
            }
        }

        let permissions = self.permissions.find_by_role(role).await?;
        best_effort(
            "fill role permissions",
            &key,
            self.cache.set_json(&key, &permissions, self.role_permissions_ttl),
        )
        .await;
        debug!(role = %role, count = permissions.len(), "Role permissions loaded from repository");
        Ok(permissions)
    }

    /// Evict the cached facts of `user_id`.
    pub async fn clear_user(&self, user_id: UserId) {
        let key = keys::user_facts(user_id);
        best_effort("clear user facts", &key, self.cache.delete(&key)).await;
    }

    /// Evict the cached permission set of `role`.
    pub async fn clear_role(&self, role: UserRole) {
        let key = keys::role_permissions(role);
        best_effort("clear role permissions", &key, self.cache.delete(&key)).await;
    }
}

/// Await a cache write, logging instead of propagating its failure.
async fn best_effort<F>(op: &'static str, key: &str, fut: F)
where
    F: Future<Output = AppResult<()>>,
{
    if let Err(e) = fut.await {
        warn!(op, key, error = %e, "Best-effort cache operation failed");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use authgate_cache::memory::MemoryCacheProvider;
    use authgate_core::config::cache::MemoryCacheConfig;
    use authgate_database::repositories::memory::{InMemoryPermissionRepository, InMemoryUserRepository};
    use authgate_entity::user::UserStatus;

    use super::*;

    /// A cache backend that is always down.
    #[derive(Debug)]
    struct Unreachable;

    #[async_trait]
    impl CacheProvider for Unreachable {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::cache("connection refused"))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn delete(&self, _key: &str) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Err(AppError::cache("connection refused"))
        }
        async fn health_check(&self) -> AppResult<bool> {
            Ok(false)
        }
    }

    struct Fixture {
        cache: AuthzCache,
        users: Arc<InMemoryUserRepository>,
        permissions: Arc<InMemoryPermissionRepository>,
    }

    fn fixture(provider: Arc<dyn CacheProvider>) -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let permissions = Arc::new(InMemoryPermissionRepository::new());
        let cache = AuthzCache::new(
            Arc::new(CacheManager::from_provider(provider)),
            users.clone(),
            permissions.clone(),
            &CacheConfig::default(),
        );
        Fixture {
            cache,
            users,
            permissions,
        }
    }

    fn memory() -> Arc<dyn CacheProvider> {
        Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 100 }))
    }

    #[tokio::test]
    async fn test_user_facts_are_served_from_cache_after_first_read() {
        let f = fixture(memory());
        let user = f.users.add("a@example.com", "hash", UserRole::Operator).await;

        let first = f.cache.get_user_facts(user.id).await.unwrap();
        let second = f.cache.get_user_facts(user.id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.role, UserRole::Operator);
        assert_eq!(f.users.find_by_id_calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_user_forces_reload() {
        let f = fixture(memory());
        let user = f.users.add("a@example.com", "hash", UserRole::Client).await;
        f.cache.get_user_facts(user.id).await.unwrap();

        f.users.update_status(user.id, UserStatus::Suspended).await.unwrap();
        assert_eq!(f.cache.get_user_facts(user.id).await.unwrap().status, UserStatus::Active);

        f.cache.clear_user(user.id).await;
        assert_eq!(f.cache.get_user_facts(user.id).await.unwrap().status, UserStatus::Suspended);
        assert_eq!(f.users.find_by_id_calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_user_leaves_other_users_cached() {
        let f = fixture(memory());
        let a = f.users.add("a@example.com", "hash", UserRole::Client).await;
        let b = f.users.add("b@example.com", "hash", UserRole::Operator).await;
        f.cache.get_user_facts(a.id).await.unwrap();
        f.cache.get_user_facts(b.id).await.unwrap();
        assert_eq!(f.users.find_by_id_calls(), 2);

        f.cache.clear_user(b.id).await;

        assert_eq!(f.cache.get_user_facts(a.id).await.unwrap().role, UserRole::Client);
        assert_eq!(f.users.find_by_id_calls(), 2);
        f.cache.get_user_facts(b.id).await.unwrap();
        assert_eq!(f.users.find_by_id_calls(), 3);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let f = fixture(memory());
        let err = f.cache.get_user_facts(UserId::new()).await.unwrap_err();
        assert_eq!(err.kind, authgate_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_role_permissions_cached_and_cleared() {
        let f = fixture(memory());
        f.permissions.seed(UserRole::Client, &["session:read"]).await.unwrap();

        assert_eq!(f.cache.get_role_permissions(UserRole::Client).await.unwrap().len(), 1);
        f.permissions
            .grant(UserRole::Client, &Permission::known("session:revoke"))
            .await
            .unwrap();
        assert_eq!(f.cache.get_role_permissions(UserRole::Client).await.unwrap().len(), 1);

        f.cache.clear_role(UserRole::Client).await;
        assert_eq!(f.cache.get_role_permissions(UserRole::Client).await.unwrap().len(), 2);
        assert_eq!(f.permissions.find_by_role_calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_to_repository() {
        let f = fixture(Arc::new(Unreachable));
        let user = f.users.add("a@example.com", "hash", UserRole::Admin).await;

        let facts = f.cache.get_user_facts(user.id).await.unwrap();
        assert_eq!(facts.role, UserRole::Admin);

        // Evictions swallow the failure.
        f.cache.clear_user(user.id).await;
        f.cache.clear_role(UserRole::Admin).await;
    }
}
