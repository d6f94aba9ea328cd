use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::required;
use super::required_password;
use super::session_response;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::SignupCommand;
use crate::domain::user::models::UserName;
use crate::inbound::http::router::AppState;

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let session = state.auth_service.signup(body.try_into_command()?).await?;

    Ok(session_response(&state, jar, StatusCode::CREATED, session))
}

/// Any `role` sent by the client is ignored; new accounts are always `user`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_confirm: Option<String>,
}

impl SignupRequest {
    fn try_into_command(self) -> Result<SignupCommand, ApiError> {
        let name = UserName::new(required(self.name, "Please tell us your name")?)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let email = EmailAddress::new(required(self.email, "Please provide your email")?)
            .map_err(|_| ApiError::BadRequest("Please provide a valid email".to_string()))?;
        let password = required_password(self.password, "Please provide a password")?;
        let password_confirm =
            required_password(self.password_confirm, "Please confirm your password")?;

        Ok(SignupCommand {
            name,
            email,
            password,
            password_confirm,
        })
    }
}
