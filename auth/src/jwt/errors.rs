use thiserror::Error;

/// Error type for session token operations.
///
/// Verification failures are split by cause so callers can log them; callers
/// facing clients are expected to collapse them into one response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}
