//! Role permission handlers.

use axum::Json;
use axum::extract::{Path, State};

use authgate_entity::permission::Permission;

use crate::dto::request::GrantPermissionRequest;
use crate::dto::response::{ApiResponse, PermissionChangeResponse, RolePermissionsResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::handlers::parse_role;
use crate::state::AppState;

/// GET /api/admin/roles/{role}/permissions
pub async fn list_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role): Path<String>,
) -> Result<Json<ApiResponse<RolePermissionsResponse>>, ApiError> {
    let role = parse_role(&role)?;
    let permissions = state.role_admin.list(&auth, role).await?;
    Ok(Json(ApiResponse::ok(RolePermissionsResponse {
        role: role.to_string(),
        permissions: permissions.iter().map(|p| p.as_str().to_string()).collect(),
    })))
}

/// POST /api/admin/roles/{role}/permissions
pub async fn grant_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(role): Path<String>,
    ValidJson(req): ValidJson<GrantPermissionRequest>,
) -> Result<Json<ApiResponse<PermissionChangeResponse>>, ApiError> {
    let role = parse_role(&role)?;
    let permission: Permission = req.permission.parse()?;
    let changed = state.role_admin.grant(&auth, role, permission).await?;
    Ok(Json(ApiResponse::ok(PermissionChangeResponse { changed })))
}

/// DELETE /api/admin/roles/{role}/permissions/{permission}
pub async fn revoke_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((role, permission)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PermissionChangeResponse>>, ApiError> {
    let role = parse_role(&role)?;
    let permission: Permission = permission.parse()?;
    let changed = state.role_admin.revoke(&auth, role, permission).await?;
    Ok(Json(ApiResponse::ok(PermissionChangeResponse { changed })))
}
