//! Token issuance.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::encode;

use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::types::UserId;

use super::claims::{AUDIENCE, Claims, ISSUER, TokenType};
use super::codec::TokenCodec;

impl TokenCodec {
    /// Issue an access token bound to `session_id`, valid for `ttl`.
    pub fn issue_access_token(
        &self,
        user_id: UserId,
        session_id: &str,
        jti: &str,
        ttl: Duration,
    ) -> AppResult<(String, Claims)> {
        if session_id.is_empty() {
            return Err(AppError::invalid_input("access token requires a session id"));
        }
        self.issue(user_id, session_id, TokenType::Access, jti, ttl)
    }

    /// Issue a refresh token valid for `ttl`. Its `jti` becomes the
    /// session's current JTI and its `exp` bounds the JTI pointer lifetime.
    pub fn issue_refresh_token(
        &self,
        user_id: UserId,
        jti: &str,
        ttl: Duration,
    ) -> AppResult<(String, Claims)> {
        self.issue(user_id, "", TokenType::Refresh, jti, ttl)
    }

    fn issue(
        &self,
        user_id: UserId,
        session_id: &str,
        token_type: TokenType,
        jti: &str,
        ttl: Duration,
    ) -> AppResult<(String, Claims)> {
        if user_id.as_uuid().is_nil() {
            return Err(AppError::invalid_input("token subject must not be empty"));
        }
        if jti.is_empty() {
            return Err(AppError::invalid_input("token id must not be empty"));
        }
        let ttl_seconds = i64::try_from(ttl.as_secs()).unwrap_or(0);
        if ttl_seconds <= 0 {
            return Err(AppError::invalid_input("token lifetime must be at least one second"));
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            session_id: session_id.to_string(),
            token_type,
            jti: jti.to_string(),
            iss: ISSUER.to_string(),
            aud: vec![AUDIENCE.to_string()],
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
        };

        let token = self.encode_claims(&claims)?;
        Ok((token, claims))
    }

    /// Sign arbitrary claims with the codec's key.
    pub(crate) fn encode_claims(&self, claims: &Claims) -> AppResult<String> {
        encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            AppError::internal(format!("Failed to encode {} token: {e}", claims.token_type))
        })
    }
}
