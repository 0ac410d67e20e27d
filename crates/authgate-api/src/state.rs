//! Application state shared across all handlers.

use std::sync::Arc;

use authgate_cache::CacheManager;
use authgate_core::config::AppConfig;
use authgate_database::DatabasePool;
use authgate_service::{AccountService, AuthService, RoleAdminService, SessionService, UserAdminService};

/// Passed to every handler via `State<AppState>`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool. `None` when running on in-memory repositories.
    pub database: Option<DatabasePool>,
    /// Authorization cache backend
    pub cache: Arc<CacheManager>,

    // ── Services ─────────────────────────────────────────────
    /// Login, refresh, logout, authentication
    pub auth: AuthService,
    /// Registration and password change
    pub accounts: AccountService,
    /// The caller's own sessions
    pub sessions: SessionService,
    /// User administration
    pub user_admin: UserAdminService,
    /// Role permission administration
    pub role_admin: RoleAdminService,
}
