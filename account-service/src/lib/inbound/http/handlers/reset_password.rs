use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::required_password;
use super::session_response;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::user::models::ResetPasswordCommand;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    jar: CookieJar,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let command = ResetPasswordCommand {
        password: required_password(body.password, "Please provide a password")?,
        password_confirm: required_password(body.password_confirm, "Please confirm your password")?,
    };
    let session = state.auth_service.reset_password(&token, command).await?;

    Ok(session_response(&state, jar, StatusCode::OK, session))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_confirm: Option<String>,
}
