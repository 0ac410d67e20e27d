//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use authgate_api::AppState;
use authgate_auth::authz::register_handlers;
use authgate_auth::session::MemorySessionStore;
use authgate_auth::{AuthzCache, Authorizer, PasswordHasher, PasswordPolicy, SessionManager, TokenCodec};
use authgate_cache::CacheManager;
use authgate_cache::memory::MemoryCacheProvider;
use authgate_core::config::cache::MemoryCacheConfig;
use authgate_core::config::{
    AppConfig, AuthConfig, CacheConfig, DatabaseConfig, EventsConfig, LoggingConfig, ServerConfig,
    SessionConfig,
};
use authgate_core::events::InvalidationBus;
use authgate_core::traits::UuidV7Generator;
use authgate_database::repositories::memory::{InMemoryPermissionRepository, InMemoryUserRepository};
use authgate_entity::permission::known;
use authgate_entity::user::{User, UserRole};
use authgate_service::{AccountService, AuthService, RoleAdminService, SessionService, UserAdminService};

pub const PASSWORD: &str = "integration walrus lantern 71";
pub const USER_AGENT: &str = "authgate-integration";
pub const CLIENT_IP: &str = "198.51.100.4";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// User records behind the API
    pub users: Arc<InMemoryUserRepository>,
    /// Role grants behind the API
    pub permissions: Arc<InMemoryPermissionRepository>,
    /// Invalidation bus, for draining background handlers
    pub bus: InvalidationBus,
    password_hash: String,
}

impl TestApp {
    /// Create a new test application on in-memory backends.
    pub async fn new() -> Self {
        let config = test_config();

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

        let cache = Arc::new(CacheManager::from_provider(Arc::new(MemoryCacheProvider::new(
            &config.cache.memory,
        ))));
        let authz_cache = Arc::new(AuthzCache::new(
            Arc::clone(&cache),
            users.clone(),
            permissions.clone(),
            &config.cache,
        ));
        let authorizer = Arc::new(Authorizer::new(Arc::clone(&authz_cache)));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(UuidV7Generator),
            &config.session,
        ));
        let bus = register_handlers(
            InvalidationBus::builder().handler_timeout(config.events.handler_timeout()),
            Arc::clone(&authz_cache),
            Arc::clone(&sessions),
        )
        .build();

        let hasher = Arc::new(PasswordHasher::new());
        let policy = Arc::new(PasswordPolicy::new(&config.auth));
        let password_hash = hasher.hash(PASSWORD).unwrap();
        let codec = Arc::new(TokenCodec::new(&config.auth));

        let state = AppState {
            auth: AuthService::new(
                users.clone(),
                Arc::clone(&hasher),
                codec,
                Arc::clone(&sessions),
                Arc::clone(&authorizer),
            ),
            sessions: SessionService::new(Arc::clone(&sessions), Arc::clone(&authorizer)),
            accounts: AccountService::new(
                users.clone(),
                Arc::clone(&hasher),
                Arc::clone(&policy),
                Arc::clone(&sessions),
                authz_cache,
                bus.clone(),
            ),
            user_admin: UserAdminService::new(
                users.clone(),
                hasher,
                policy,
                Arc::clone(&authorizer),
                Arc::clone(&sessions),
                bus.clone(),
            ),
            role_admin: RoleAdminService::new(permissions.clone(), authorizer, bus.clone()),
            config: Arc::new(config),
            database: None,
            cache,
        };

        Self {
            router: authgate_api::build_router(state),
            users,
            permissions,
            bus,
            password_hash,
        }
    }

    /// Add an active user whose password is [`PASSWORD`].
    pub async fn add_user(&self, email: &str, role: UserRole) -> User {
        self.users.add(email, &self.password_hash, role).await
    }

    /// Send a request and return the status and parsed JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("user-agent", USER_AGENT)
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Log in and return the token pair from the response `data`.
    pub async fn login(&self, email: &str) -> Value {
        self.login_with(email, PASSWORD).await
    }

    /// Log in with an explicit password.
    pub async fn login_with(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"].clone()
    }

    /// Log in and return only the access token.
    pub async fn access_token(&self, email: &str) -> String {
        self.login(email).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Drain background invalidation handlers.
    pub async fn settle(&self) {
        self.bus.wait().await;
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
            connect_timeout_seconds: 1,
            idle_timeout_seconds: 1,
        },
        cache: CacheConfig {
            provider: "memory".to_string(),
            memory: MemoryCacheConfig { max_capacity: 1_000 },
            ..CacheConfig::default()
        },
        auth: AuthConfig {
            jwt_secret: "integration-tests-secret-0123456789abcdef".to_string(),
            ..AuthConfig::default()
        },
        session: SessionConfig {
            store: "memory".to_string(),
            ..SessionConfig::default()
        },
        events: EventsConfig {
            handler_timeout_seconds: 2,
        },
        logging: LoggingConfig::default(),
    }
}
