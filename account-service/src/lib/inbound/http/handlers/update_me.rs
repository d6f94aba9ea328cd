use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::UserName;
use crate::inbound::http::router::AppState;

pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .auth_service
        .update_me(&identity, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

/// Profile fields a user may change about themselves. Role and active flag
/// are not accepted; password fields are rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_confirm: Option<String>,
}

impl UpdateMeRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, ApiError> {
        if self.password.is_some() || self.password_confirm.is_some() {
            return Err(ApiError::BadRequest(
                "This route is not for password updates. Please use /updateMyPassword".to_string(),
            ));
        }

        let name = self
            .name
            .map(UserName::new)
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let email = self
            .email
            .map(EmailAddress::new)
            .transpose()
            .map_err(|_| ApiError::BadRequest("Please provide a valid email".to_string()))?;

        Ok(UpdateProfileCommand { name, email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_fields_are_rejected() {
        let request: UpdateMeRequest =
            serde_json::from_str(r#"{"name":"B","password":"x"}"#).unwrap();
        assert!(matches!(
            request.try_into_command(),
            Err(ApiError::BadRequest(msg)) if msg.contains("/updateMyPassword")
        ));
    }

    #[test]
    fn test_only_provided_fields_are_set() {
        let request: UpdateMeRequest =
            serde_json::from_str(r#"{"email":"New@X.com","role":"admin"}"#).unwrap();
        let command = request.try_into_command().unwrap();

        assert_eq!(command.name, None);
        assert_eq!(command.email.unwrap().as_str(), "new@x.com");
    }
}
