//! Authentication primitives
//!
//! Provides the security-critical building blocks of the account service:
//! - Password hashing (Argon2id)
//! - Session token issuance and verification (HS256 JWT)
//! - Password reset tokens (random raw value, SHA-256 digest at rest)
//! - Session staleness after a password change
//! - Authentication coordination
//!
//! Nothing here performs I/O; time is always passed in by the caller.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenService;
//! use chrono::{Duration, Utc};
//!
//! let service = TokenService::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(1));
//! let now = Utc::now();
//! let issued = service.issue("user123", now).unwrap();
//! let claims = service.verify(&issued.token, now).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```
//!
//! ## Reset Tokens
//! ```
//! use auth::reset::{self, ResetToken};
//!
//! let token = ResetToken::generate();
//! // Persist only the digest; mail the raw value.
//! assert_eq!(reset::digest(token.raw()), token.digest());
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod session;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::IssuedToken;
pub use jwt::SessionClaims;
pub use jwt::TokenError;
pub use jwt::TokenService;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use reset::ResetToken;
