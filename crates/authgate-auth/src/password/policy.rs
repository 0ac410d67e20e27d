//! Strength rules for new passwords.

use authgate_core::config::AuthConfig;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;

/// Checks new passwords at registration, account creation, and password change.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    /// Build the policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Reject `password` if it is too short or too guessable.
    ///
    /// `user_inputs` are account-specific strings (such as the email) that
    /// the strength estimator treats as known to an attacker.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> AppResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if estimate.score() < zxcvbn::Score::Three {
            return Err(AppError::invalid_input(
                "Password is too weak. Please use a longer or less predictable password",
            ));
        }
        Ok(())
    }

    /// Reject a password change that keeps the current password.
    pub fn validate_not_same(&self, current: &str, new: &str) -> AppResult<()> {
        if current == new {
            return Err(AppError::invalid_input(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(&AuthConfig::default())
    }
}
