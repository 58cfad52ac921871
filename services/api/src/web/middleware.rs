//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The account identifier of the authenticated caller.
#[derive(Debug, Clone)]
pub struct SessionUser(pub String);

/// Middleware that validates the session cookie and extracts the user_id.
///
/// If valid, inserts a [`SessionUser`] into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = state.cookies.token_from_headers(req.headers())?;
    let user_id = state.auth.require_session(&token).await?;

    debug!(%user_id, uri = %req.uri().path(), "Auth middleware: session valid");
    req.extensions_mut().insert(SessionUser(user_id));

    Ok(next.run(req).await)
}
