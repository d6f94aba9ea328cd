use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::AuthSession;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::EmailMessage;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::ResetPasswordCommand;
use crate::domain::user::models::Role;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::UpdatePasswordCommand;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AuthError;
use crate::user::errors::DeliveryError;
use crate::user::errors::UserError;

/// Port for the authentication gateway.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account and sign it in.
    ///
    /// # Errors
    /// * `Validation` - Password and confirmation differ
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Internal` - Hashing, signing or storage failed
    async fn signup(&self, command: SignupCommand) -> Result<AuthSession, AuthError>;

    /// Exchange email and password for a session token.
    ///
    /// # Errors
    /// * `MissingCredentials` - Email or password absent
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError>;

    /// Resolve a bearer token to the user it authenticates.
    ///
    /// Fails closed: every failure, expected or not, is `Unauthenticated`.
    async fn protect(&self, token: Option<&str>) -> Result<AuthenticatedUser, AuthError>;

    /// Check the caller holds one of `allowed` roles.
    ///
    /// # Errors
    /// * `Forbidden` - Role not in `allowed`
    fn restrict_to(&self, allowed: &[Role], identity: &AuthenticatedUser) -> Result<(), AuthError>;

    /// Issue a reset token and email its link to the account owner.
    ///
    /// # Errors
    /// * `NotFound` - No active user with this email
    /// * `DeliveryFailure` - Email could not be sent; reset state was rolled back
    async fn forgot_password(&self, email: &str) -> Result<(), AuthError>;

    /// Redeem a reset token and set a new password.
    ///
    /// Password and confirmation are compared before the token is looked up,
    /// so a mismatch returns `Validation` and leaves the token redeemable.
    ///
    /// # Errors
    /// * `Validation` - Password and confirmation differ
    /// * `InvalidOrExpiredReset` - Token unknown, already used, or expired
    async fn reset_password(
        &self,
        raw_token: &str,
        command: ResetPasswordCommand,
    ) -> Result<AuthSession, AuthError>;

    /// Change the caller's password after re-checking the current one.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Current password wrong
    /// * `Validation` - New password and confirmation differ
    async fn update_password(
        &self,
        identity: &AuthenticatedUser,
        command: UpdatePasswordCommand,
    ) -> Result<AuthSession, AuthError>;

    /// Current profile of the caller.
    async fn get_me(&self, identity: &AuthenticatedUser) -> Result<User, AuthError>;

    /// Change the caller's name and/or email.
    async fn update_me(
        &self,
        identity: &AuthenticatedUser,
        command: UpdateProfileCommand,
    ) -> Result<User, AuthError>;

    /// Soft-delete the caller's account.
    async fn delete_me(&self, identity: &AuthenticatedUser) -> Result<(), AuthError>;

    /// All active accounts.
    async fn list_users(&self) -> Result<Vec<User>, AuthError>;
}

/// Credential store.
///
/// Deactivated users are invisible to every lookup. Only the
/// `*_with_secret` lookups populate `User::password_hash`.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier, without password hash.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by identifier, including password hash.
    async fn find_by_id_with_secret(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by email, without password hash.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Retrieve user by email, including password hash.
    async fn find_by_email_with_secret(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError>;

    /// All active users.
    async fn list_active(&self) -> Result<Vec<User>, UserError>;

    /// Apply a profile change.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    async fn update_profile(
        &self,
        id: &UserId,
        command: &UpdateProfileCommand,
    ) -> Result<User, UserError>;

    /// Replace the password hash and record when it changed.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, UserError>;

    /// Record an outstanding reset token digest, replacing any previous one.
    async fn store_password_reset(
        &self,
        id: &UserId,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), UserError>;

    /// Drop any outstanding reset token.
    async fn clear_password_reset(&self, id: &UserId) -> Result<(), UserError>;

    /// Atomically find the user whose reset digest equals `digest` and whose
    /// expiry is after `now`, clear both fields, and return the user.
    ///
    /// Two concurrent calls with the same digest must not both return a user.
    async fn redeem_password_reset(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserError>;

    /// Mark the user inactive.
    async fn deactivate(&self, id: &UserId) -> Result<(), UserError>;
}

/// Outbound email.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Send one message.
    ///
    /// # Errors
    /// * `InvalidMessage` - Addresses or body rejected by the transport
    /// * `Transport` - Relay unreachable or refused the message
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}
