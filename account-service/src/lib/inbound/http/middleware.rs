use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::handlers::ApiError;
use super::handlers::SESSION_COOKIE;
use crate::domain::user::models::AuthenticatedUser;
use crate::domain::user::models::Role;
use crate::inbound::http::router::AppState;
use crate::user::errors::AuthError;

/// Resolve the session token and store the caller in request extensions.
///
/// The bearer header wins over the cookie when both are present.
pub async fn protect(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .map(str::to_string)
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    let identity = state.auth_service.protect(token.as_deref()).await?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Admit only callers holding one of `allowed`. Must run after [`protect`].
pub async fn restrict_to(
    allowed: &'static [Role],
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::Unauthenticated)?;
    state.auth_service.restrict_to(allowed, identity)?;

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
