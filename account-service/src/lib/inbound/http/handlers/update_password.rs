use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::required_password;
use super::session_response;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::UpdatePasswordCommand;
use crate::inbound::http::router::AppState;

/// Change the caller's password. The response carries a fresh token, since
/// the one used for this request is no longer accepted afterwards.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
    jar: CookieJar,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let command = UpdatePasswordCommand {
        current_password: required_password(
            body.password_current,
            "Please provide your current password",
        )?,
        password: required_password(body.password, "Please provide a password")?,
        password_confirm: required_password(body.password_confirm, "Please confirm your password")?,
    };
    let session = state
        .auth_service
        .update_password(&identity, command)
        .await?;

    Ok(session_response(&state, jar, StatusCode::OK, session))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    password_current: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_confirm: Option<String>,
}
