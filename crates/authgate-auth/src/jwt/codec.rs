//! Token codec construction.

use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use authgate_core::config::AuthConfig;

use super::claims::{AUDIENCE, ISSUER};

/// Signs and verifies HS256 tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenCodec {
    pub(super) encoding_key: EncodingKey,
    pub(super) decoding_key: DecodingKey,
    pub(super) header: Header,
    /// Full validation: signature, `iss`, `aud`, `nbf`, `exp`.
    pub(super) validation: Validation,
    /// Same as `validation` minus `exp`, used to classify expiry failures.
    pub(super) validation_ignoring_exp: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.header.alg)
            .field("leeway", &self.validation.leeway)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = config.leeway_seconds;
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);

        let mut validation_ignoring_exp = validation.clone();
        validation_ignoring_exp.validate_exp = false;
        validation_ignoring_exp.set_required_spec_claims(&["nbf", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            validation,
            validation_ignoring_exp,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    /// Configured access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}
