use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::IssuedToken;
use crate::jwt::SessionClaims;
use crate::jwt::TokenError;
use crate::jwt::TokenService;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and session tokens.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_service: TokenService,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
}

impl Authenticator {
    /// Create an authenticator with default hashing cost.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for token signing
    /// * `token_ttl` - Lifetime of issued session tokens
    pub fn new(jwt_secret: &[u8], token_ttl: Duration) -> Self {
        Self::with_hasher(PasswordHasher::new(), jwt_secret, token_ttl)
    }

    /// Create an authenticator around a pre-configured hasher.
    pub fn with_hasher(
        password_hasher: PasswordHasher,
        jwt_secret: &[u8],
        token_ttl: Duration,
    ) -> Self {
        Self {
            password_hasher,
            token_service: TokenService::new(jwt_secret, token_ttl),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be parsed
    /// * `TokenError` - Token signing failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: impl ToString,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_service.issue(subject, now)?)
    }

    /// Issue a session token without password verification.
    ///
    /// For flows that have already proven identity by other means
    /// (signup, password reset, password change).
    pub fn issue_token(
        &self,
        subject: impl ToString,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        self.token_service.issue(subject, now)
    }

    /// Validate a session token at `now`.
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        self.token_service.verify(token, now)
    }
}
