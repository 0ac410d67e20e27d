//! The caller's view of their own sessions.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use authgate_auth::session::SessionDeletion;
use authgate_auth::{Authorizer, SessionManager};
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_entity::permission::{Permission, known};
use authgate_entity::session::SessionView;

use crate::context::AuthContext;

/// Which of the caller's sessions to revoke.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevokeSessions {
    /// Explicit session ids.
    #[serde(default)]
    pub session_ids: Vec<String>,
    /// Revoke every session except the one making the request.
    #[serde(default)]
    pub remove_others: bool,
}

/// Lists and revokes the caller's sessions.
#[derive(Debug, Clone)]
pub struct SessionService {
    sessions: Arc<SessionManager>,
    authorizer: Arc<Authorizer>,
}

impl SessionService {
    /// Create the service.
    pub fn new(sessions: Arc<SessionManager>, authorizer: Arc<Authorizer>) -> Self {
        Self {
            sessions,
            authorizer,
        }
    }

    /// The caller's live sessions, most recently used first.
    pub async fn list(&self, ctx: &AuthContext) -> AppResult<Vec<SessionView>> {
        self.authorizer
            .authorize(ctx.user_id, &Permission::known(known::SESSION_READ))
            .await?;
        self.sessions
            .get_sessions_by_user(ctx.user_id, &ctx.session_id)
            .await
    }

    /// Revoke some of the caller's sessions. Returns how many were removed.
    pub async fn revoke(&self, ctx: &AuthContext, request: RevokeSessions) -> AppResult<u64> {
        if !request.remove_others && request.session_ids.is_empty() {
            return Err(AppError::invalid_input(
                "Provide session ids or set remove_others",
            ));
        }
        self.authorizer
            .authorize(ctx.user_id, &Permission::known(known::SESSION_REVOKE))
            .await?;

        let removed = self
            .sessions
            .delete_sessions(SessionDeletion {
                user_id: ctx.user_id,
                current_session_id: ctx.session_id.clone(),
                target_ids: request.session_ids,
                remove_others: request.remove_others,
            })
            .await?;
        info!(user_id = %ctx.user_id, removed, "Sessions revoked by owner");
        Ok(removed)
    }
}
