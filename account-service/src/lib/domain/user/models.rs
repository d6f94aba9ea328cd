use std::fmt;
use std::str::FromStr;

use auth::IssuedToken;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::RoleError;
use crate::user::errors::UserIdError;
use crate::user::errors::UserNameError;

/// User aggregate entity.
///
/// `password_hash` is only populated by the `*_with_secret` repository
/// lookups; every other read leaves it `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub password_hash: Option<String>,
    pub role: Role,
    pub active: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a freshly signed-up user with the default role.
    pub fn new(
        name: UserName,
        email: EmailAddress,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            password_hash: Some(password_hash),
            role: Role::default(),
            active: true,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at,
        }
    }

    /// Drop the password hash before the user leaves the domain.
    pub fn without_secret(mut self) -> Self {
        self.password_hash = None;
        self
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type
///
/// Trimmed, non-empty, at most 64 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    const MAX_LENGTH: usize = 64;

    /// Create a new valid name.
    ///
    /// # Errors
    /// * `Empty` - Name is blank
    /// * `TooLong` - Name longer than 64 characters
    pub fn new(name: String) -> Result<Self, UserNameError> {
        let name = name.trim().to_string();
        let length = name.chars().count();
        if length == 0 {
            Err(UserNameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(UserNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser and stores it
/// lower-cased so lookups by email are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Permission level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "guide" => Ok(Role::Guide),
            "lead-guide" => Ok(Role::LeadGuide),
            "admin" => Ok(Role::Admin),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plaintext password supplied by a client.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Option<Self> {
        if password.is_empty() {
            None
        } else {
            Some(Self(password))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Identity resolved by the session gate and handed to downstream handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn id(&self) -> &UserId {
        &self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }
}

/// Successful outcome of every token-issuing operation.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: IssuedToken,
}

/// Command to register a new account
#[derive(Debug)]
pub struct SignupCommand {
    pub name: UserName,
    pub email: EmailAddress,
    pub password: Password,
    pub password_confirm: Password,
}

/// Raw login input; either field may be missing
#[derive(Debug, Default)]
pub struct LoginCommand {
    pub email: Option<String>,
    pub password: Option<Password>,
}

impl LoginCommand {
    /// Empty strings count as missing.
    pub fn new(email: Option<String>, password: Option<String>) -> Self {
        Self {
            email: email.filter(|e| !e.trim().is_empty()),
            password: password.and_then(Password::new),
        }
    }
}

/// New password submitted together with a reset token
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub password: Password,
    pub password_confirm: Password,
}

/// Authenticated password change
#[derive(Debug)]
pub struct UpdatePasswordCommand {
    pub current_password: Password,
    pub password: Password,
    pub password_confirm: Password,
}

/// Self-service profile change; only provided fields are updated.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateProfileCommand {
    pub name: Option<UserName>,
    pub email: Option<EmailAddress>,
}

/// Outgoing email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}
