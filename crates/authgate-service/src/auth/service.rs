//! Login, refresh, logout, and per-request authentication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use authgate_auth::jwt::Claims;
use authgate_auth::session::{NewSession, SessionDeletion, SessionRotation};
use authgate_auth::{Authorizer, PasswordHasher, SessionManager, TokenCodec};
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::types::UserId;
use authgate_database::repositories::UserRepository;
use authgate_entity::user::{UserRole, UserStatus};

use crate::context::AuthContext;

/// Credentials presented at login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub device: String,
    pub ip: String,
}

/// A refresh request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
    pub device: String,
    pub ip: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Single-use token for the next refresh.
    pub refresh_token: String,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Session both tokens belong to.
    pub session_id: String,
    /// Always `Bearer`.
    pub token_type: String,
}

/// The caller's own account, as shown by `/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub session_id: String,
}

/// Issues and checks credentials.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<PasswordHasher>,
    codec: Arc<TokenCodec>,
    sessions: Arc<SessionManager>,
    authorizer: Arc<Authorizer>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl AuthService {
    /// Create the service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<PasswordHasher>,
        codec: Arc<TokenCodec>,
        sessions: Arc<SessionManager>,
        authorizer: Arc<Authorizer>,
    ) -> Self {
        Self {
            users,
            hasher,
            codec,
            sessions,
            authorizer,
        }
    }

    /// Verify email and password, open a session, and issue a token pair.
    ///
    /// A bad email and a bad password fail identically.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AppError::invalid_input("Email and password are required"));
        }

        let Some(user) = self.users.find_by_email(input.email.trim()).await? else {
            self.hasher.waste_verification(&input.password);
            info!(email = %input.email, "Login failed: unknown email");
            return Err(invalid_credentials());
        };

        if !self.hasher.verify(&input.password, &user.password_hash)? {
            info!(user_id = %user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Inactive => return Err(AppError::forbidden("Account is not activated")),
            UserStatus::Suspended => return Err(AppError::forbidden("Account is suspended")),
        }

        let refresh_jti = self.sessions.next_id();
        let (refresh_token, refresh_claims) =
            self.codec
                .issue_refresh_token(user.id, &refresh_jti, self.codec.refresh_ttl())?;

        let session_id = self
            .sessions
            .create_session(NewSession {
                user_id: user.id,
                jti: refresh_jti,
                jti_expires_at: refresh_claims.expires_at(),
                ip: input.ip,
                device: input.device,
            })
            .await?;

        let tokens = self.finish_pair(user.id, session_id, refresh_token, &refresh_claims)?;
        info!(user_id = %user.id, session_id = %tokens.session_id, "User logged in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair, consuming it.
    ///
    /// Reusing a consumed token is `Unauthorized` and issues nothing.
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let claims = self.codec.parse_refresh_token(&input.refresh_token)?;

        if !self.sessions.is_jti_valid(&claims.jti).await? {
            warn!(user_id = %claims.user_id, ip = %input.ip, "Refresh with revoked or consumed token");
            return Err(AppError::unauthorized("Refresh token has been revoked or already used"));
        }

        self.authorizer.check_status(claims.user_id).await?;

        let new_jti = self.sessions.next_id();
        let (refresh_token, refresh_claims) =
            self.codec
                .issue_refresh_token(claims.user_id, &new_jti, self.codec.refresh_ttl())?;

        let session_id = self
            .sessions
            .rotate_session_jti(SessionRotation {
                old_jti: claims.jti,
                new_jti,
                jti_expires_at: refresh_claims.expires_at(),
                ip: input.ip,
                device: input.device,
            })
            .await?;

        let tokens = self.finish_pair(claims.user_id, session_id, refresh_token, &refresh_claims)?;
        info!(user_id = %claims.user_id, session_id = %tokens.session_id, "Tokens refreshed");
        Ok(tokens)
    }

    /// End the caller's session. Its access token stops working immediately.
    pub async fn logout(&self, ctx: &AuthContext) -> AppResult<()> {
        self.sessions
            .delete_sessions(SessionDeletion {
                user_id: ctx.user_id,
                current_session_id: ctx.session_id.clone(),
                target_ids: vec![ctx.session_id.clone()],
                remove_others: false,
            })
            .await?;
        info!(user_id = %ctx.user_id, session_id = %ctx.session_id, "User logged out");
        Ok(())
    }

    /// Resolve an access token to a caller.
    ///
    /// Fails if the token is invalid or expired, if its session was
    /// revoked, or if the account is no longer active.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<AuthContext> {
        let claims = self.codec.parse_access_token(access_token)?;

        if !self
            .sessions
            .is_session_active(claims.user_id, &claims.session_id)
            .await?
        {
            return Err(AppError::unauthorized("Session has been revoked"));
        }

        let facts = self.authorizer.check_status(claims.user_id).await?;
        Ok(AuthContext {
            user_id: claims.user_id,
            session_id: claims.session_id,
            jti: claims.jti,
            role: facts.role,
        })
    }

    /// The caller's account.
    pub async fn profile(&self, ctx: &AuthContext) -> AppResult<Profile> {
        let user = self
            .users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(Profile {
            user_id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            session_id: ctx.session_id.clone(),
        })
    }

    fn finish_pair(
        &self,
        user_id: UserId,
        session_id: String,
        refresh_token: String,
        refresh_claims: &Claims,
    ) -> AppResult<AuthTokens> {
        let access_jti = self.sessions.next_id();
        let (access_token, access_claims) =
            self.codec
                .issue_access_token(user_id, &session_id, &access_jti, self.codec.access_ttl())?;

        Ok(AuthTokens {
            access_token,
            access_expires_at: access_claims.expires_at(),
            refresh_token,
            refresh_expires_at: refresh_claims.expires_at(),
            session_id,
            token_type: "Bearer".to_string(),
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid email or password")
}

#[cfg(test)]
mod tests {
    use authgate_core::error::ErrorKind;
    use authgate_core::events::InvalidationEvent;

    use super::*;
    use crate::testing::{Harness, PASSWORD};

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: password.to_string(),
            device: "laptop".to_string(),
            ip: "10.0.0.1".to_string(),
        }
    }

    fn refresh_input(token: &str) -> RefreshInput {
        RefreshInput {
            refresh_token: token.to_string(),
            device: "laptop".to_string(),
            ip: "10.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_refresh_reuse_logout_scenario() {
        let h = Harness::new().await;
        let user = h.add_user("u1@example.com", UserRole::Client).await;

        let pair1 = h.auth.login(login_input("u1@example.com", PASSWORD)).await.unwrap();
        let j1 = h.codec.parse_refresh_token(&pair1.refresh_token).unwrap().jti;
        assert!(h.sessions.is_jti_valid(&j1).await.unwrap());

        let pair2 = h.auth.refresh(refresh_input(&pair1.refresh_token)).await.unwrap();
        let j2 = h.codec.parse_refresh_token(&pair2.refresh_token).unwrap().jti;
        assert_eq!(pair2.session_id, pair1.session_id);
        assert!(!h.sessions.is_jti_valid(&j1).await.unwrap());
        assert!(h.sessions.is_jti_valid(&j2).await.unwrap());

        let replay = h.auth.refresh(refresh_input(&pair1.refresh_token)).await;
        assert_eq!(replay.unwrap_err().kind, ErrorKind::Unauthorized);

        let ctx = h.auth.authenticate(&pair2.access_token).await.unwrap();
        assert_eq!(ctx.user_id, user.id);
        h.auth.logout(&ctx).await.unwrap();

        assert!(!h.sessions.is_jti_valid(&j2).await.unwrap());
        assert!(h.sessions.get_sessions_by_user(user.id, "").await.unwrap().is_empty());
        let err = h.auth.authenticate(&pair2.access_token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_bad_email_and_bad_password_look_the_same() {
        let h = Harness::new().await;
        h.add_user("u1@example.com", UserRole::Client).await;

        let unknown = h.auth.login(login_input("nobody@example.com", PASSWORD)).await.unwrap_err();
        let wrong = h.auth.login(login_input("u1@example.com", "wrong")).await.unwrap_err();
        assert_eq!(unknown.kind, ErrorKind::Unauthorized);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn test_suspended_user_cannot_login() {
        let h = Harness::new().await;
        let user = h.add_user("u1@example.com", UserRole::Client).await;
        h.users.update_status(user.id, UserStatus::Suspended).await.unwrap();

        let err = h.auth.login(login_input("u1@example.com", PASSWORD)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let h = Harness::new().await;
        h.add_user("u1@example.com", UserRole::Client).await;
        let pair = h.auth.login(login_input("u1@example.com", PASSWORD)).await.unwrap();

        let err = h.auth.refresh(refresh_input(&pair.access_token)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_status_change_applies_after_invalidation() {
        let h = Harness::new().await;
        let user = h.add_user("u1@example.com", UserRole::Client).await;
        let pair = h.auth.login(login_input("u1@example.com", PASSWORD)).await.unwrap();
        h.auth.authenticate(&pair.access_token).await.unwrap();

        h.users.update_status(user.id, UserStatus::Suspended).await.unwrap();
        h.bus.publish(InvalidationEvent::UserChanged { user_id: user.id });
        h.bus.wait().await;

        let err = h.auth.authenticate(&pair.access_token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        let err = h.auth.refresh(refresh_input(&pair.refresh_token)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_profile_reports_current_session() {
        let h = Harness::new().await;
        h.add_user("u1@example.com", UserRole::Operator).await;
        let pair = h.auth.login(login_input("u1@example.com", PASSWORD)).await.unwrap();
        let ctx = h.auth.authenticate(&pair.access_token).await.unwrap();

        let profile = h.auth.profile(&ctx).await.unwrap();
        assert_eq!(profile.role, UserRole::Operator);
        assert_eq!(profile.session_id, pair.session_id);
    }
}
