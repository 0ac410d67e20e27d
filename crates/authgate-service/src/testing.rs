//! Fully in-memory service graph for unit tests.

use std::sync::Arc;
use std::time::Duration;

use authgate_auth::authz::register_handlers;
use authgate_auth::session::MemorySessionStore;
use authgate_auth::{AuthzCache, Authorizer, PasswordHasher, PasswordPolicy, SessionManager, TokenCodec};
use authgate_cache::CacheManager;
use authgate_cache::memory::MemoryCacheProvider;
use authgate_core::config::cache::MemoryCacheConfig;
use authgate_core::config::{AuthConfig, CacheConfig, SessionConfig};
use authgate_core::events::InvalidationBus;
use authgate_core::traits::UuidV7Generator;
use authgate_database::repositories::memory::{InMemoryPermissionRepository, InMemoryUserRepository};
use authgate_entity::permission::known;
use authgate_entity::user::{User, UserRole};

use crate::{
    AccountService, AuthContext, AuthService, LoginInput, RoleAdminService, SessionService, UserAdminService,
};

pub const PASSWORD: &str = "correct horse battery staple";

pub struct Harness {
    pub users: Arc<InMemoryUserRepository>,
    pub codec: Arc<TokenCodec>,
    pub sessions: Arc<SessionManager>,
    pub authorizer: Arc<Authorizer>,
    pub bus: InvalidationBus,
    pub auth: AuthService,
    pub accounts: AccountService,
    pub session_service: SessionService,
    pub user_admin: UserAdminService,
    pub role_admin: RoleAdminService,
    password_hash: String,
}

impl Harness {
    pub async fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let permissions = Arc::new(InMemoryPermissionRepository::new());
        permissions.seed(UserRole::Admin, &["full_access"]).await.unwrap();
        permissions
            .seed(
                UserRole::Operator,
                &[known::USER_READ, known::USER_CHANGE_STATUS, known::SESSION_READ, known::SESSION_REVOKE],
            )
            .await
            .unwrap();
        permissions
            .seed(UserRole::Client, &[known::SESSION_READ, known::SESSION_REVOKE])
            .await
            .unwrap();

        let cache = Arc::new(AuthzCache::new(
            Arc::new(CacheManager::from_provider(Arc::new(MemoryCacheProvider::new(
                &MemoryCacheConfig { max_capacity: 1000 },
            )))),
            users.clone(),
            permissions.clone(),
            &CacheConfig::default(),
        ));
        let authorizer = Arc::new(Authorizer::new(cache.clone()));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(UuidV7Generator),
            &SessionConfig::default(),
        ));
        let bus = register_handlers(
            InvalidationBus::builder().handler_timeout(Duration::from_secs(1)),
            cache.clone(),
            sessions.clone(),
        )
        .build();

        let codec = Arc::new(TokenCodec::new(&AuthConfig {
            jwt_secret: "service-tests-secret-of-at-least-32-bytes".to_string(),
            ..AuthConfig::default()
        }));
        let hasher = Arc::new(PasswordHasher::new());
        let policy = Arc::new(PasswordPolicy::default());
        let password_hash = hasher.hash(PASSWORD).unwrap();

        Self {
            auth: AuthService::new(users.clone(), hasher.clone(), codec.clone(), sessions.clone(), authorizer.clone()),
            accounts: AccountService::new(
                users.clone(),
                hasher.clone(),
                policy.clone(),
                sessions.clone(),
                cache,
                bus.clone(),
            ),
            session_service: SessionService::new(sessions.clone(), authorizer.clone()),
            user_admin: UserAdminService::new(
                users.clone(),
                hasher,
                policy,
                authorizer.clone(),
                sessions.clone(),
                bus.clone(),
            ),
            role_admin: RoleAdminService::new(permissions, authorizer.clone(), bus.clone()),
            users,
            codec,
            sessions,
            authorizer,
            bus,
            password_hash,
        }
    }

    /// Add an active user whose password is [`PASSWORD`].
    pub async fn add_user(&self, email: &str, role: UserRole) -> User {
        self.users.add(email, &self.password_hash, role).await
    }

    /// Log in and authenticate, returning the caller context.
    pub async fn login_ctx(&self, email: &str) -> AuthContext {
        let tokens = self
            .auth
            .login(LoginInput {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                device: "test".to_string(),
                ip: "127.0.0.1".to_string(),
            })
            .await
            .unwrap();
        self.auth.authenticate(&tokens.access_token).await.unwrap()
    }
}
