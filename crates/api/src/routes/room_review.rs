//! Route definitions for the `/room-review` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::room_review;
use crate::state::AppState;

/// Routes mounted at `/v1/room-review`.
///
/// ```text
/// POST   /          -> create
/// PUT    /          -> update (id in body)
/// GET    /list      -> list (?room_id= &user_id= &search=)
/// GET    /single    -> get_single (?id=)
/// GET    /{id}      -> get_by_id
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(room_review::create).put(room_review::update))
        .route("/list", get(room_review::list))
        .route("/single", get(room_review::get_single))
        .route("/{id}", get(room_review::get_by_id).delete(room_review::delete))
}
