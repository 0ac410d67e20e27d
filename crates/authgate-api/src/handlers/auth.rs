//! Authentication handlers (register, login, refresh, logout, me, password).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use authgate_service::{AuthTokens, ChangePasswordInput, LoginInput, Profile, RefreshInput, RegisterInput};

use crate::dto::request::{ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, MessageResponse, PasswordChangeResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ClientInfo, ValidJson};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = state
        .accounts
        .register(RegisterInput {
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    let device = client.device_or(req.device);
    let tokens = state
        .auth
        .login(LoginInput {
            email: req.email,
            password: req.password,
            device,
            ip: client.ip,
        })
        .await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthTokens>>, ApiError> {
    let device = client.device_or(req.device);
    let tokens = state
        .auth
        .refresh(RefreshInput {
            refresh_token: req.refresh_token,
            device,
            ip: client.ip,
        })
        .await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth.logout(&auth).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.auth.profile(&auth).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<PasswordChangeResponse>>, ApiError> {
    let revoked = state
        .accounts
        .change_password(
            &auth,
            ChangePasswordInput {
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(PasswordChangeResponse {
        message: "Password changed. Log in again on every device".to_string(),
        sessions_revoked: revoked,
    })))
}
