use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request as ExtractRequest;
use axum::extract::State;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::middleware::Next;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_me::delete_me;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_me::get_me;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::reset_password::reset_password;
use super::handlers::signup::signup;
use super::handlers::update_me::update_me;
use super::handlers::update_password::update_password;
use super::middleware::protect;
use super::middleware::restrict_to;
use crate::domain::user::models::Role;
use crate::domain::user::ports::AuthServicePort;

/// Roles allowed to list every account
const USER_ADMIN_ROLES: &[Role] = &[Role::Admin, Role::LeadGuide];

/// Attributes of the `jwt` session cookie.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub expiration_days: i64,
    pub secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub cookie: CookieSettings,
}

pub fn create_router(auth_service: Arc<dyn AuthServicePort>, cookie: CookieSettings) -> Router {
    let state = AppState {
        auth_service,
        cookie,
    };

    let public_routes = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:token", patch(reset_password));

    let protected_routes = Router::new()
        .route("/updateMyPassword", patch(update_password))
        .route("/me", get(get_me))
        .route("/updateMe", patch(update_me))
        .route("/deleteMe", delete(delete_me));

    let admin_routes = Router::new().route("/", get(list_users)).route_layer(
        middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, req: ExtractRequest, next: Next| {
                restrict_to(USER_ADMIN_ROLES, state, req, next)
            },
        ),
    );

    // Layers added later run first: protect resolves the identity restrict_to reads
    let gated_routes = protected_routes
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let users = Router::new().merge(public_routes).merge(gated_routes);

    Router::new()
        .nest("/api/v1/users", users)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
