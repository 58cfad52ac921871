pub mod auth;
pub mod cookies;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the application router (used by the binary and the tests).
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(rest::home_handler))
        .route("/health", get(rest::health_handler))
        .route("/image/{id}", get(rest::get_image_handler))
        .route("/userdata/{id}", get(rest::get_record_handler))
        .route("/user/{id}", put(rest::update_record_handler))
        .route("/user", post(rest::insert_record_handler))
        .route("/edit/{id}", get(rest::edit_redirect_handler))
        .route("/edit-page/{id}", get(rest::edit_page_handler))
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", get(auth::logout_handler));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/me", get(auth::session_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
