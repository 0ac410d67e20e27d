//! AuthGate Server: credential and session lifecycle service
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use authgate_auth::authz::register_handlers;
use authgate_auth::session::{MemorySessionStore, RedisSessionStore};
use authgate_auth::{
    AuthzCache, Authorizer, PasswordHasher, PasswordPolicy, SessionManager, SessionStore, SessionSweeper, TokenCodec,
};
use authgate_cache::CacheManager;
use authgate_cache::redis::RedisClient;
use authgate_core::config::AppConfig;
use authgate_core::error::AppError;
use authgate_core::events::InvalidationBus;
use authgate_core::traits::UuidV7Generator;
use authgate_database::DatabasePool;
use authgate_database::migration::run_migrations;
use authgate_database::repositories::{PgPermissionRepository, PgUserRepository};
use authgate_service::{AccountService, AuthService, RoleAdminService, SessionService, UserAdminService};

#[tokio::main]
async fn main() {
    let env = std::env::var("AUTHGATE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AuthGate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database ─────────────────────────────────────────
    let database = DatabasePool::connect(&config.database).await?;
    run_migrations(&database.pool()).await?;

    let users = Arc::new(PgUserRepository::new(database.pool()));
    let permissions = Arc::new(PgPermissionRepository::new(database.pool()));

    // ── Step 2: Redis and cache ──────────────────────────────────
    let needs_redis = config.cache.provider == "redis" || config.session.store == "redis";
    let redis = if needs_redis {
        Some(RedisClient::connect(&config.cache.redis).await?)
    } else {
        None
    };
    let cache = Arc::new(CacheManager::new(&config.cache, redis.clone())?);

    // ── Step 3: Session store ────────────────────────────────────
    let store: Arc<dyn SessionStore> = match (config.session.store.as_str(), redis) {
        ("redis", Some(client)) => {
            tracing::info!("Using Redis session store");
            Arc::new(RedisSessionStore::new(client))
        }
        ("memory", _) => {
            tracing::warn!("Using in-memory session store; sessions are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
        (other, _) => {
            return Err(AppError::configuration(format!(
                "Unknown session store: '{other}'. Supported: memory, redis"
            )));
        }
    };

    // ── Step 4: Auth components ──────────────────────────────────
    let codec = Arc::new(TokenCodec::new(&config.auth));
    let hasher = Arc::new(PasswordHasher::new());
    let policy = Arc::new(PasswordPolicy::new(&config.auth));
    let sessions = Arc::new(SessionManager::new(
        Arc::clone(&store),
        Arc::new(UuidV7Generator),
        &config.session,
    ));
    let authz_cache = Arc::new(AuthzCache::new(
        Arc::clone(&cache),
        users.clone(),
        permissions.clone(),
        &config.cache,
    ));
    let authorizer = Arc::new(Authorizer::new(Arc::clone(&authz_cache)));

    // ── Step 5: Invalidation bus ─────────────────────────────────
    let bus = register_handlers(
        InvalidationBus::builder().handler_timeout(config.events.handler_timeout()),
        Arc::clone(&authz_cache),
        Arc::clone(&sessions),
    )
    .build();

    // ── Step 6: Services ─────────────────────────────────────────
    let auth = AuthService::new(
        users.clone(),
        Arc::clone(&hasher),
        codec,
        Arc::clone(&sessions),
        Arc::clone(&authorizer),
    );
    let session_service = SessionService::new(Arc::clone(&sessions), Arc::clone(&authorizer));
    let accounts = AccountService::new(
        users.clone(),
        Arc::clone(&hasher),
        Arc::clone(&policy),
        Arc::clone(&sessions),
        authz_cache,
        bus.clone(),
    );
    let user_admin = UserAdminService::new(
        users,
        hasher,
        policy,
        Arc::clone(&authorizer),
        Arc::clone(&sessions),
        bus.clone(),
    );
    let role_admin = RoleAdminService::new(permissions, authorizer, bus.clone());

    // ── Step 7: Session sweeper ──────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = SessionSweeper::new(store, config.session.sweep_interval());
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    // ── Step 8: HTTP server ──────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = authgate_api::AppState {
        config: Arc::new(config),
        database: Some(database.clone()),
        cache,
        auth,
        accounts,
        sessions: session_service,
        user_admin,
        role_admin,
    };
    let app = authgate_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("AuthGate server listening on {}", addr);

    // ── Step 9: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 10: Drain background work ───────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    if tokio::time::timeout(grace, bus.wait()).await.is_err() {
        tracing::warn!(in_flight = bus.in_flight(), "Invalidation handlers still running at shutdown");
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    database.close().await;

    tracing::info!("AuthGate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
