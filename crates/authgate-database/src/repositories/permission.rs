//! Role permission repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;
use authgate_entity::permission::Permission;
use authgate_entity::user::UserRole;

use super::PermissionRepository;

/// PostgreSQL-backed [`PermissionRepository`] over the `role_permissions` table.
#[derive(Debug, Clone)]
pub struct PgPermissionRepository {
    pool: PgPool,
}

impl PgPermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<Permission>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT permission FROM role_permissions WHERE role = $1 ORDER BY permission",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load role permissions", e)
        })?;

        // Rows the current build does not understand are skipped rather than
        // failing every authorization check for the role.
        Ok(rows
            .into_iter()
            .filter_map(|raw| match raw.parse::<Permission>() {
                Ok(p) => Some(p),
                Err(_) => {
                    tracing::warn!(role = %role, permission = %raw, "Skipping malformed permission row");
                    None
                }
            })
            .collect())
    }

    async fn grant(&self, role: UserRole, permission: &Permission) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO role_permissions (role, permission) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(role)
        .bind(permission.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to grant permission", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke(&self, role: UserRole, permission: &Permission) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role = $1 AND permission = $2")
                .bind(role)
                .bind(permission.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to revoke permission", e)
                })?;
        Ok(result.rows_affected() > 0)
    }
}
