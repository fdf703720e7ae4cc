//! Route tree.
//!
//! Every resource lives under `/v1`; `/health` sits at the root.

pub mod auth;
pub mod health;
pub mod room;
pub mod room_review;
pub mod session;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// All versioned routes, to be nested at `/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", user::router())
        .nest("/session", session::router())
        .nest("/room", room::router())
        .nest("/room-review", room_review::router())
}
