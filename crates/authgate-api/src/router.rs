//! Route definitions.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::state::AppState;

/// Build the complete application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth_routes())
        .merge(session_routes())
        .merge(admin_routes())
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.server))
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/password", put(handlers::auth::change_password))
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::sessions::list_sessions))
        .route("/sessions/revoke", post(handlers::sessions::revoke_sessions))
}

fn admin_routes() -> Router<AppState> {
    use handlers::admin::{roles, users};

    Router::new()
        .route("/admin/users", get(users::list_users).post(users::create_user))
        .route(
            "/admin/users/{id}",
            get(users::get_user).delete(users::delete_user),
        )
        .route("/admin/users/{id}/role", put(users::change_role))
        .route("/admin/users/{id}/status", put(users::change_status))
        .route(
            "/admin/roles/{role}/permissions",
            get(roles::list_permissions).post(roles::grant_permission),
        )
        .route(
            "/admin/roles/{role}/permissions/{permission}",
            axum::routing::delete(roles::revoke_permission),
        )
}
