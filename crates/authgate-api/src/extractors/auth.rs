//! Bearer token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use authgate_core::error::AppError;
use authgate_service::AuthContext;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller.
///
/// Runs the full per-request check: token signature and claims, session
/// liveness, and account status.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl std::ops::Deref for AuthUser {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized("Missing or malformed Authorization header"))?;

        let ctx = state.auth.authenticate(bearer.token()).await?;
        Ok(AuthUser(ctx))
    }
}
