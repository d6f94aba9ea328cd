use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use account_service::domain::user::models::EmailAddress;
use account_service::domain::user::models::EmailMessage;
use account_service::domain::user::models::Role;
use account_service::domain::user::models::UpdateProfileCommand;
use account_service::domain::user::models::User;
use account_service::domain::user::models::UserId;
use account_service::domain::user::ports::Clock;
use account_service::domain::user::ports::EmailSender;
use account_service::domain::user::ports::UserRepository;
use account_service::domain::user::service::AuthService;
use account_service::domain::user::service::AuthSettings;
use account_service::inbound::http::router::create_router;
use account_service::inbound::http::router::CookieSettings;
use account_service::user::errors::DeliveryError;
use account_service::user::errors::UserError;
use async_trait::async_trait;
use auth::reset;
use auth::Authenticator;
use auth::PasswordHasher;
use chrono::DateTime;
use chrono::Utc;

pub const PUBLIC_URL: &str = "http://accounts.test";
pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryUserRepository>,
    pub mailbox: Arc<RecordingEmailSender>,
    pub clock: Arc<TestClock>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryUserRepository::default());
        let mailbox = Arc::new(RecordingEmailSender::default());
        let clock = Arc::new(TestClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));

        // Cheap Argon2 parameters keep the suite fast
        let authenticator = Arc::new(Authenticator::with_hasher(
            PasswordHasher::with_params(1024, 1, 1).unwrap(),
            JWT_SECRET,
            chrono::Duration::hours(TOKEN_TTL_HOURS),
        ));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&repository),
            Arc::clone(&mailbox),
            Arc::clone(&clock),
            authenticator,
            AuthSettings {
                public_url: PUBLIC_URL.to_string(),
                email_timeout: Duration::from_secs(2),
            },
        ));

        let router = create_router(
            auth_service,
            CookieSettings {
                expiration_days: 90,
                secure: false,
            },
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            repository,
            mailbox,
            clock,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(self.url(path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(self.url(path))
    }

    /// Helper to make PATCH request
    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.patch(self.url(path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.patch(path).bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(self.url(path)).bearer_auth(token)
    }

    /// Sign up a user and return its session token
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> String {
        let response = self
            .post("/signup")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
                "passwordConfirm": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Raw reset token from the most recent email sent to `email`
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        let body = self
            .mailbox
            .sent()
            .into_iter()
            .rev()
            .find(|m| m.to.as_str() == email)?
            .body;
        self.reset_token_in(&body)
    }

    /// Raw reset token carried by the link in an email body
    pub fn reset_token_in(&self, body: &str) -> Option<String> {
        let prefix = format!("{}/api/v1/users/resetPassword/", PUBLIC_URL);
        let start = body.find(&prefix)? + prefix.len();

        Some(
            body[start..]
                .chars()
                .take_while(|c| c.is_ascii_hexdigit())
                .collect(),
        )
    }
}

/// Clock the tests move by hand
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Email sender that keeps every message and can be told to fail
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<bool>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_deliveries(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        if *self.failing.lock().unwrap() {
            return Err(DeliveryError::Transport("relay unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Credential store backed by a map; one lock per call keeps every
/// operation atomic.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Stored record including inactive users and secrets
    pub fn record(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned()
    }

    pub fn set_role(&self, email: &str, role: Role) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.values_mut().find(|u| u.email.as_str() == email) {
            user.role = role;
        }
    }

    fn find_active<F>(&self, predicate: F, with_secret: bool) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.active && predicate(u))
            .cloned()
            .map(|u| if with_secret { u } else { u.without_secret() })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.find_active(|u| u.id == *id, false))
    }

    async fn find_by_id_with_secret(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.find_active(|u| u.id == *id, true))
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self.find_active(|u| u.email == *email, false))
    }

    async fn find_by_email_with_secret(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError> {
        Ok(self.find_active(|u| u.email == *email, true))
    }

    async fn list_active(&self) -> Result<Vec<User>, UserError> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.active)
            .cloned()
            .map(User::without_secret)
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: &UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &command.email {
            if users.values().any(|u| u.id != *id && u.email == *email) {
                return Err(UserError::EmailAlreadyExists(email.to_string()));
            }
        }

        let user = users
            .get_mut(id)
            .filter(|u| u.active)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        if let Some(name) = &command.name {
            user.name = name.clone();
        }
        if let Some(email) = &command.email {
            user.email = email.clone();
        }
        Ok(user.clone().without_secret())
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .filter(|u| u.active)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        user.password_hash = Some(password_hash.to_string());
        user.password_changed_at = Some(changed_at);
        Ok(user.clone().without_secret())
    }

    async fn store_password_reset(
        &self,
        id: &UserId,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), UserError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        user.password_reset_token = Some(digest.to_string());
        user.password_reset_expires = Some(expires_at);
        Ok(())
    }

    async fn clear_password_reset(&self, id: &UserId) -> Result<(), UserError> {
        if let Some(user) = self.users.lock().unwrap().get_mut(id) {
            user.password_reset_token = None;
            user.password_reset_expires = None;
        }
        Ok(())
    }

    async fn redeem_password_reset(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.values_mut().find(|u| {
            u.active
                && u
                    .password_reset_token
                    .as_deref()
                    .is_some_and(|stored| reset::digests_match(stored, digest))
                && u.password_reset_expires.is_some_and(|expires| expires > now)
        }) else {
            return Ok(None);
        };

        user.password_reset_token = None;
        user.password_reset_expires = None;
        Ok(Some(user.clone().without_secret()))
    }

    async fn deactivate(&self, id: &UserId) -> Result<(), UserError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(id)
            .filter(|u| u.active)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        user.active = false;
        Ok(())
    }
}
