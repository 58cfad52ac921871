//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user registration, login, and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use cardio_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::services::Registration;
use crate::web::middleware::SessionUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: String,
    pub user_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: String,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: String,
}

/// Reads a required string field from a JSON body.
fn required_str(body: &Value, field: &str) -> Result<String, PortError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(PortError::MissingField(field.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(PortError::InvalidFormat(format!("{field} must be a string"))),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new user account
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    info!(handler = "register", "Handler: POST /register");

    let registration = Registration {
        username: required_str(&body, "username")?,
        password: required_str(&body, "password")?,
        first_name: required_str(&body, "first_name")?,
        last_name: required_str(&body, "last_name")?,
        email: required_str(&body, "email")?,
    };
    let user_id = state.auth.register(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: "User registered successfully".to_string(),
            user_id,
        }),
    ))
}

/// POST /login - Login with an existing account
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let username = required_str(&body, "username")?;
    let password = required_str(&body, "password")?;
    info!(handler = "login", %username, "Handler: POST /login");

    let outcome = state.auth.login(&username, &password).await?;
    let cookie = state.cookies.set_cookie(&outcome.token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: "Login successful".to_string(),
            user_id: outcome.user_id,
        }),
    ))
}

/// GET /logout - Logout and invalidate the session
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    info!(handler = "logout", "Handler: GET /logout");
    let token = state.cookies.token_from_headers(&headers)?;
    state.auth.logout(&token).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookies.clear_cookie())],
        Json(LogoutResponse {
            success: "Logged out successfully".to_string(),
        }),
    ))
}

/// GET /me - The account behind the current session
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Active session", body = SessionResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn session_handler(Extension(SessionUser(user_id)): Extension<SessionUser>) -> Json<SessionResponse> {
    Json(SessionResponse { user_id })
}
