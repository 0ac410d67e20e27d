//! User administration handlers.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use authgate_core::error::AppError;
use authgate_core::types::PageResponse;
use authgate_entity::user::{UserRole, UserStatus};
use authgate_service::CreateUserInput;

use crate::dto::request::{ChangeRoleRequest, ChangeStatusRequest, CreateUserRequest, UserListQuery};
use crate::dto::response::{ApiResponse, MessageResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::handlers::parse_user_id;
use crate::state::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PageResponse<UserResponse>>>, ApiError> {
    let Query(query) = query.map_err(|e| AppError::invalid_input(e.body_text()))?;
    let filter = query.filter()?;
    let page = state
        .user_admin
        .list_users(&auth, &filter, query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page.map(UserResponse::from))))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let role: UserRole = req.role.parse()?;
    let status = match req.status.as_deref() {
        Some(raw) => raw.parse()?,
        None => UserStatus::Active,
    };
    let user = state
        .user_admin
        .create_user(
            &auth,
            CreateUserInput {
                email: req.email,
                password: req.password,
                role,
                status,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let user = state.user_admin.get_user(&auth, user_id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

/// PUT /api/admin/users/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let role: UserRole = req.role.parse()?;
    state.user_admin.change_role(&auth, user_id, role).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Role changed to {role}"),
    })))
}

/// PUT /api/admin/users/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let status: UserStatus = req.status.parse()?;
    state.user_admin.change_status(&auth, user_id, status).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Status changed to {status}"),
    })))
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.user_admin.delete_user(&auth, user_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "User deleted".to_string(),
    })))
}
