//! Route definitions for the `/user` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/v1/user`.
///
/// ```text
/// POST   /          -> create
/// PUT    /          -> update (id in body)
/// GET    /list      -> list
/// GET    /single    -> get_single (?id= | ?email= | ?role=)
/// GET    /{id}      -> get_by_id
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(user::create).put(user::update))
        .route("/list", get(user::list))
        .route("/single", get(user::get_single))
        .route("/{id}", get(user::get_by_id).delete(user::delete))
}
