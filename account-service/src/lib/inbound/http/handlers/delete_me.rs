use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use crate::domain::user::models::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> Result<StatusCode, ApiError> {
    state.auth_service.delete_me(&identity).await?;

    Ok(StatusCode::NO_CONTENT)
}
