//! Route definitions for the `/session` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::session;
use crate::state::AppState;

/// Routes mounted at `/v1/session`.
///
/// ```text
/// PUT    /          -> update (id in body)
/// GET    /list      -> list
/// GET    /{id}      -> get_by_id
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", put(session::update))
        .route("/list", get(session::list))
        .route("/{id}", get(session::get_by_id).delete(session::delete))
}
