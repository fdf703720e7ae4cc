//! Route definitions for the `/room` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::room;
use crate::state::AppState;

/// Routes mounted at `/v1/room`.
///
/// ```text
/// POST   /          -> create
/// PUT    /          -> update (id in body)
/// GET    /list      -> list
/// GET    /single    -> get_single (?id=)
/// GET    /{id}      -> get_by_id
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(room::create).put(room::update))
        .route("/list", get(room::list))
        .route("/single", get(room::get_single))
        .route("/{id}", get(room::get_by_id).delete(room::delete))
}
