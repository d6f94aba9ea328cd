use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for display name validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserNameError {
    #[error("Please tell us your name")]
    Empty,

    #[error("Name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Failure to hand a message to the mail transport
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Delivery timed out after {0} seconds")]
    Timeout(u64),
}

/// Credential store errors
#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] UserNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Authentication gateway errors.
///
/// Display strings are what clients see, so none of them reveal which check
/// failed inside the credential or session paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Please provide email and password")]
    MissingCredentials,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("You are not logged in or your session is no longer valid. Please log in again")]
    Unauthenticated,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("There is no user with this email address")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Token is invalid or has expired")]
    InvalidOrExpiredReset,

    #[error("There was an error sending the email. Try again later")]
    DeliveryFailure,

    #[error("Something went wrong")]
    Internal(String),
}

impl AuthError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailAlreadyExists(_) => AuthError::EmailAlreadyExists,
            UserError::InvalidName(e) => AuthError::Validation(e.to_string()),
            UserError::InvalidEmail(e) => AuthError::Validation(e.to_string()),
            UserError::NotFound(_)
            | UserError::InvalidUserId(_)
            | UserError::InvalidRole(_)
            | UserError::DatabaseError(_) => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
