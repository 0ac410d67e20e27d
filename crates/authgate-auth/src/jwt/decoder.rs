//! Token verification.
//!
//! Every failure maps to `Unauthorized`, except a token whose only defect
//! is an elapsed `exp`, which maps to `TokenExpired` so clients know to
//! refresh instead of logging in again.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Validation, decode};
use tracing::debug;

use authgate_core::error::AppError;
use authgate_core::result::AppResult;

use super::claims::{Claims, TokenType};
use super::codec::TokenCodec;

impl TokenCodec {
    /// Verify signature, issuer, audience, and time bounds, then require
    /// `expected` as the token type.
    pub fn parse_and_validate(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let claims = match self.decode_with(token, &self.validation) {
            Ok(claims) => claims,
            Err(e) if *e.kind() == JwtErrorKind::ExpiredSignature => {
                // Expired only counts as such when nothing else is wrong.
                return match self.decode_with(token, &self.validation_ignoring_exp) {
                    Ok(_) => Err(AppError::token_expired("Token has expired")),
                    Err(e) => Err(map_jwt_error(&e)),
                };
            }
            Err(e) => return Err(map_jwt_error(&e)),
        };

        if claims.token_type != expected {
            debug!(expected = %expected, actual = %claims.token_type, "Token type mismatch");
            return Err(AppError::unauthorized(format!(
                "Invalid token type: expected {expected} token"
            )));
        }

        Self::validate_claims(&claims)?;
        Ok(claims)
    }

    /// Parse an access token.
    pub fn parse_access_token(&self, token: &str) -> AppResult<Claims> {
        self.parse_and_validate(token, TokenType::Access)
    }

    /// Parse a refresh token.
    pub fn parse_refresh_token(&self, token: &str) -> AppResult<Claims> {
        self.parse_and_validate(token, TokenType::Refresh)
    }

    /// Structural checks jsonwebtoken does not perform.
    pub fn validate_claims(claims: &Claims) -> AppResult<()> {
        if claims.user_id.as_uuid().is_nil() {
            return Err(AppError::unauthorized("Token is missing its subject"));
        }
        if claims.jti.is_empty() {
            return Err(AppError::unauthorized("Token is missing its id"));
        }
        if claims.token_type == TokenType::Access && claims.session_id.is_empty() {
            return Err(AppError::unauthorized("Access token is not bound to a session"));
        }
        if claims.token_type == TokenType::Refresh && !claims.session_id.is_empty() {
            return Err(AppError::unauthorized("Refresh token must not carry a session id"));
        }
        if claims.exp <= claims.iat {
            return Err(AppError::unauthorized("Token expires before it was issued"));
        }
        Ok(())
    }

    fn decode_with(
        &self,
        token: &str,
        validation: &Validation,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, validation).map(|data| data.claims)
    }
}

fn map_jwt_error(e: &jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        JwtErrorKind::InvalidToken => AppError::unauthorized("Invalid token format"),
        JwtErrorKind::InvalidSignature => AppError::unauthorized("Invalid token signature"),
        JwtErrorKind::InvalidIssuer => AppError::unauthorized("Invalid token issuer"),
        JwtErrorKind::InvalidAudience => AppError::unauthorized("Invalid token audience"),
        JwtErrorKind::ImmatureSignature => AppError::unauthorized("Token is not valid yet"),
        JwtErrorKind::InvalidAlgorithm => AppError::unauthorized("Unexpected signing algorithm"),
        _ => AppError::unauthorized(format!("Token validation failed: {e}")),
    }
}
