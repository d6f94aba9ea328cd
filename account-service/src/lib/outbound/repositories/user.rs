use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserName;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, active, password_changed_at, \
                            password_reset_token, password_reset_expires, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    active: bool,
    password_changed_at: Option<DateTime<Utc>>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, with_secret: bool) -> Result<User, UserError> {
        Ok(User {
            id: UserId(self.id),
            name: UserName::new(self.name)?,
            email: EmailAddress::new(self.email)?,
            password_hash: with_secret.then_some(self.password_hash),
            role: self.role.parse::<Role>()?,
            active: self.active,
            password_changed_at: self.password_changed_at,
            password_reset_token: self.password_reset_token,
            password_reset_expires: self.password_reset_expires,
            created_at: self.created_at,
        })
    }
}

fn database_error(e: sqlx::Error, email: &EmailAddress) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return UserError::EmailAlreadyExists(email.as_str().to_string());
        }
    }
    UserError::DatabaseError(e.to_string())
}

fn query_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        filter: &str,
        value: FilterValue<'_>,
        with_secret: bool,
    ) -> Result<Option<User>, UserError> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} = $1 AND active = TRUE",
            USER_COLUMNS, filter
        );
        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match value {
            FilterValue::Id(id) => query.bind(id),
            FilterValue::Text(text) => query.bind(text),
        };

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .map(|row| row.into_user(with_secret))
            .transpose()
    }
}

enum FilterValue<'a> {
    Id(Uuid),
    Text(&'a str),
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| UserError::DatabaseError("missing password hash".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, active, password_changed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(password_hash)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(user.password_changed_at)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error(e, &user.email))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        self.find_one("id", FilterValue::Id(id.0), false).await
    }

    async fn find_by_id_with_secret(&self, id: &UserId) -> Result<Option<User>, UserError> {
        self.find_one("id", FilterValue::Id(id.0), true).await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        self.find_one("email", FilterValue::Text(email.as_str()), false)
            .await
    }

    async fn find_by_email_with_secret(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserError> {
        self.find_one("email", FilterValue::Text(email.as_str()), true)
            .await
    }

    async fn list_active(&self) -> Result<Vec<User>, UserError> {
        let sql = format!(
            "SELECT {} FROM users WHERE active = TRUE ORDER BY created_at DESC",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|row| row.into_user(false))
            .collect()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: &UpdateProfileCommand,
    ) -> Result<User, UserError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), email = COALESCE($3, email)
            WHERE id = $1 AND active = TRUE
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .bind(command.name.as_ref().map(UserName::as_str))
            .bind(command.email.as_ref().map(EmailAddress::as_str))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match &command.email {
                Some(email) => database_error(e, email),
                None => query_error(e),
            })?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        row.into_user(false)
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<User, UserError> {
        let sql = format!(
            r#"
            UPDATE users
            SET password_hash = $2, password_changed_at = $3
            WHERE id = $1 AND active = TRUE
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .bind(password_hash)
            .bind(changed_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        row.into_user(false)
    }

    async fn store_password_reset(
        &self,
        id: &UserId,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expires = $3
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id.0)
        .bind(digest)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn clear_password_reset(&self, id: &UserId) -> Result<(), UserError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = NULL, password_reset_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn redeem_password_reset(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        // Single statement: a concurrent redeemer sees the cleared row and matches nothing
        let sql = format!(
            r#"
            UPDATE users
            SET password_reset_token = NULL, password_reset_expires = NULL
            WHERE password_reset_token = $1 AND password_reset_expires > $2 AND active = TRUE
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&sql)
            .bind(digest)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .map(|row| row.into_user(false))
            .transpose()
    }

    async fn deactivate(&self, id: &UserId) -> Result<(), UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET active = FALSE
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
