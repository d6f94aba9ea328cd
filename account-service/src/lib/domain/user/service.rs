use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::reset;
use auth::session;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::ResetToken;
use auth::TokenError;
use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

use crate::domain::user::models::AuthSession;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::EmailMessage;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::Password;
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
use crate::user::ports::AuthServicePort;
use crate::user::ports::Clock;
use crate::user::ports::EmailSender;
use crate::user::ports::UserRepository;

/// Verified against when the login email is unknown, so both failure paths
/// pay for one Argon2 run.
const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Deployment-specific settings of the gateway.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Base URL that reset links point at
    pub public_url: String,
    /// Upper bound on a single email delivery attempt
    pub email_timeout: Duration,
}

/// Why a session was refused. Logged, never returned to clients.
#[derive(Debug, Error)]
enum SessionRejection {
    #[error("no token presented")]
    MissingToken,

    #[error("token rejected: {0}")]
    Token(#[from] TokenError),

    #[error("token subject is not a user id")]
    InvalidSubject,

    #[error("user no longer exists")]
    UserGone,

    #[error("password changed after token was issued")]
    PasswordChanged,

    #[error("credential store failed: {0}")]
    Store(#[from] UserError),
}

/// Authentication gateway.
///
/// Holds no per-session state: every request is judged from the signed token
/// and the credential store alone.
pub struct AuthService<UR, ES, C>
where
    UR: UserRepository,
    ES: EmailSender,
    C: Clock,
{
    repository: Arc<UR>,
    email_sender: Arc<ES>,
    clock: Arc<C>,
    authenticator: Arc<Authenticator>,
    settings: AuthSettings,
}

impl<UR, ES, C> AuthService<UR, ES, C>
where
    UR: UserRepository,
    ES: EmailSender,
    C: Clock,
{
    /// Create a new gateway with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store
    /// * `email_sender` - Outbound email transport
    /// * `clock` - Time source for token issue/expiry and reset windows
    /// * `authenticator` - Password hashing and session token handling
    /// * `settings` - Reset link base URL and delivery timeout
    pub fn new(
        repository: Arc<UR>,
        email_sender: Arc<ES>,
        clock: Arc<C>,
        authenticator: Arc<Authenticator>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            repository,
            email_sender,
            clock,
            authenticator,
            settings,
        }
    }

    /// Argon2 is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: Password) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(password.expose()))
            .await
            .map_err(AuthError::internal)?
            .map_err(AuthError::from)
    }

    async fn verify_password(&self, password: Password, hash: String) -> Result<bool, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || {
            authenticator.verify_password(password.expose(), &hash)
        })
        .await
        .map_err(AuthError::internal)?
        .map_err(AuthError::from)
    }

    fn issue(&self, user: User, now: DateTime<Utc>) -> Result<AuthSession, AuthError> {
        let token = self
            .authenticator
            .issue_token(user.id, now)
            .map_err(AuthError::internal)?;

        Ok(AuthSession {
            user: user.without_secret(),
            token,
        })
    }

    async fn resolve_session(
        &self,
        token: Option<&str>,
    ) -> Result<AuthenticatedUser, SessionRejection> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionRejection::MissingToken)?;

        let claims = self.authenticator.validate_token(token, self.clock.now())?;
        let user_id =
            UserId::from_string(&claims.sub).map_err(|_| SessionRejection::InvalidSubject)?;

        let user = self
            .repository
            .find_by_id(&user_id)
            .await?
            .ok_or(SessionRejection::UserGone)?;

        if session::changed_password_after(user.password_changed_at, claims.iat) {
            return Err(SessionRejection::PasswordChanged);
        }

        Ok(AuthenticatedUser { user })
    }

    fn reset_message(&self, to: &EmailAddress, raw_token: &str) -> EmailMessage {
        let reset_url = format!(
            "{}/api/v1/users/resetPassword/{}",
            self.settings.public_url.trim_end_matches('/'),
            raw_token
        );

        EmailMessage {
            to: to.clone(),
            subject: format!(
                "Your password reset token (valid for {} min)",
                reset::RESET_TOKEN_TTL_MINUTES
            ),
            body: format!(
                "Forgot your password? Submit a PATCH request with your new password and \
                 passwordConfirm to: {}.\nIf you didn't forget your password, please ignore this email!",
                reset_url
            ),
        }
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        tokio::time::timeout(self.settings.email_timeout, self.email_sender.send(message))
            .await
            .map_err(|_| DeliveryError::Timeout(self.settings.email_timeout.as_secs()))?
    }
}

fn ensure_confirmed(password: &Password, confirm: &Password) -> Result<(), AuthError> {
    if password != confirm {
        return Err(AuthError::Validation(
            "Passwords are not the same".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl<UR, ES, C> AuthServicePort for AuthService<UR, ES, C>
where
    UR: UserRepository,
    ES: EmailSender,
    C: Clock,
{
    async fn signup(&self, command: SignupCommand) -> Result<AuthSession, AuthError> {
        ensure_confirmed(&command.password, &command.password_confirm)?;

        let now = self.clock.now();
        let password_hash = self.hash_password(command.password).await?;
        let user = User::new(command.name, command.email, password_hash, now);

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "Account created");

        self.issue(created_user, now)
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError> {
        let (Some(email), Some(password)) = (command.email, command.password) else {
            return Err(AuthError::MissingCredentials);
        };

        let user = match EmailAddress::new(email) {
            Ok(email) => self.repository.find_by_email_with_secret(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            let _ = self
                .verify_password(password, UNKNOWN_USER_HASH.to_string())
                .await;
            tracing::warn!("Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let stored_hash = user
            .password_hash
            .clone()
            .ok_or_else(|| AuthError::internal("password hash not loaded"))?;
        let authenticator = Arc::clone(&self.authenticator);
        let user_id = user.id;
        let now = self.clock.now();

        let token = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(password.expose(), &stored_hash, user_id, now)
        })
        .await
        .map_err(AuthError::internal)?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                tracing::warn!(user_id = %user_id, "Login rejected: wrong password");
                AuthError::InvalidCredentials
            }
            other => AuthError::internal(other),
        })?;

        tracing::info!(user_id = %user_id, "Login succeeded");

        Ok(AuthSession {
            user: user.without_secret(),
            token,
        })
    }

    async fn protect(&self, token: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        self.resolve_session(token).await.map_err(|reason| {
            tracing::warn!(reason = %reason, "Session rejected");
            AuthError::Unauthenticated
        })
    }

    fn restrict_to(&self, allowed: &[Role], identity: &AuthenticatedUser) -> Result<(), AuthError> {
        if allowed.contains(&identity.role()) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %identity.id(),
                role = %identity.role(),
                "Access denied for role"
            );
            Err(AuthError::Forbidden)
        }
    }

    async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = EmailAddress::new(email.to_string())
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let now = self.clock.now();
        let token = ResetToken::generate();
        self.repository
            .store_password_reset(&user.id, token.digest(), reset::expires_at(now))
            .await?;

        let message = self.reset_message(&user.email, token.raw());
        if let Err(e) = self.deliver(&message).await {
            tracing::error!(user_id = %user.id, error = %e, "Password reset email failed");

            if let Err(rollback) = self.repository.clear_password_reset(&user.id).await {
                tracing::error!(
                    user_id = %user.id,
                    error = %rollback,
                    "Failed to roll back password reset token"
                );
                return Err(rollback.into());
            }

            return Err(AuthError::DeliveryFailure);
        }

        tracing::info!(user_id = %user.id, "Password reset token sent");
        Ok(())
    }

    async fn reset_password(
        &self,
        raw_token: &str,
        command: ResetPasswordCommand,
    ) -> Result<AuthSession, AuthError> {
        ensure_confirmed(&command.password, &command.password_confirm)?;

        let now = self.clock.now();
        let user = self
            .repository
            .redeem_password_reset(&reset::digest(raw_token), now)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Password reset rejected: unknown, used or expired token");
                AuthError::InvalidOrExpiredReset
            })?;

        let password_hash = self.hash_password(command.password).await?;
        let user = self
            .repository
            .update_password(&user.id, &password_hash, session::password_changed_timestamp(now))
            .await?;
        tracing::info!(user_id = %user.id, "Password reset");

        self.issue(user, now)
    }

    async fn update_password(
        &self,
        identity: &AuthenticatedUser,
        command: UpdatePasswordCommand,
    ) -> Result<AuthSession, AuthError> {
        ensure_confirmed(&command.password, &command.password_confirm)?;

        let user = self
            .repository
            .find_by_id_with_secret(identity.id())
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        let stored_hash = user
            .password_hash
            .ok_or_else(|| AuthError::internal("password hash not loaded"))?;

        if !self
            .verify_password(command.current_password, stored_hash)
            .await?
        {
            tracing::warn!(user_id = %user.id, "Password change rejected: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let password_hash = self.hash_password(command.password).await?;
        let user = self
            .repository
            .update_password(&user.id, &password_hash, session::password_changed_timestamp(now))
            .await?;
        tracing::info!(user_id = %user.id, "Password changed");

        self.issue(user, now)
    }

    async fn get_me(&self, identity: &AuthenticatedUser) -> Result<User, AuthError> {
        self.repository
            .find_by_id(identity.id())
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    async fn update_me(
        &self,
        identity: &AuthenticatedUser,
        command: UpdateProfileCommand,
    ) -> Result<User, AuthError> {
        self.repository
            .update_profile(identity.id(), &command)
            .await
            .map(User::without_secret)
            .map_err(|e| match e {
                UserError::NotFound(_) => AuthError::Unauthenticated,
                other => other.into(),
            })
    }

    async fn delete_me(&self, identity: &AuthenticatedUser) -> Result<(), AuthError> {
        self.repository
            .deactivate(identity.id())
            .await
            .map_err(|e| match e {
                UserError::NotFound(_) => AuthError::Unauthenticated,
                other => other.into(),
            })?;
        tracing::info!(user_id = %identity.id(), "Account deactivated");

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.repository.list_active().await?)
    }
}
