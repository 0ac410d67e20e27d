//! The caller's own sessions.

use axum::Json;
use axum::extract::State;

use authgate_entity::session::SessionView;
use authgate_service::RevokeSessions;

use crate::dto::request::RevokeSessionsRequest;
use crate::dto::response::{ApiResponse, RevokeResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<SessionView>>>, ApiError> {
    let sessions = state.sessions.list(&auth).await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// POST /api/sessions/revoke
pub async fn revoke_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<RevokeSessionsRequest>,
) -> Result<Json<ApiResponse<RevokeResponse>>, ApiError> {
    let removed = state
        .sessions
        .revoke(
            &auth,
            RevokeSessions {
                session_ids: req.session_ids,
                remove_others: req.remove_others,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(RevokeResponse { removed })))
}
