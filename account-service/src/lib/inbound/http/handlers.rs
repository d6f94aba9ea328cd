use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::user::models::AuthSession;
use crate::domain::user::models::Password;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::inbound::http::router::AppState;
use crate::user::errors::AuthError;

pub mod delete_me;
pub mod forgot_password;
pub mod get_me;
pub mod list_users;
pub mod login;
pub mod reset_password;
pub mod signup;
pub mod update_me;
pub mod update_password;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "jwt";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::Validation(_)
            | AuthError::MissingCredentials
            | AuthError::InvalidOrExpiredReset => ApiError::BadRequest(message),
            AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                ApiError::Unauthorized(message)
            }
            AuthError::Forbidden => ApiError::Forbidden(message),
            AuthError::NotFound => ApiError::NotFound(message),
            AuthError::EmailAlreadyExists => ApiError::Conflict(message),
            AuthError::DeliveryFailure => ApiError::InternalServerError(message),
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                ApiError::InternalServerError(message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Public view of a user. Never carries password or reset fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub token: String,
    pub user: UserData,
}

/// Response for every token-issuing route: body plus the session cookie.
pub(crate) fn session_response(
    state: &AppState,
    jar: CookieJar,
    status: StatusCode,
    session: AuthSession,
) -> (CookieJar, ApiSuccess<SessionResponseData>) {
    let cookie = Cookie::build((SESSION_COOKIE, session.token.token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.cookie.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(state.cookie.expiration_days));

    (
        jar.add(cookie),
        ApiSuccess::new(
            status,
            SessionResponseData {
                token: session.token.token,
                user: (&session.user).into(),
            },
        ),
    )
}

/// Non-empty string field of a request body.
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

pub(crate) fn required_password(
    value: Option<String>,
    message: &str,
) -> Result<Password, ApiError> {
    Password::new(required(value, message)?)
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}
