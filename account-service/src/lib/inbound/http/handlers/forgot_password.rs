use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::required;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiSuccess<ForgotPasswordResponseData>, ApiError> {
    let email = required(body.email, "Please provide your email")?;
    state.auth_service.forgot_password(&email).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ForgotPasswordResponseData {
            message: "Token sent to email!".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForgotPasswordResponseData {
    pub message: String,
}
