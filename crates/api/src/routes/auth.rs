//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/v1/auth`.
///
/// ```text
/// POST /register      -> register
/// POST /verify-email  -> verify_email
/// POST /login         -> login
/// POST /logout        -> logout (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-email", post(auth::verify_email))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}
