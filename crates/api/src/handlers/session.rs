//! Handlers for the `/session` resource.
//!
//! Sessions are created only through login; these endpoints let operators
//! inspect and revoke them.

use axum::extract::State;
use axum::http::StatusCode;
use hotel_core::types::DbId;
use hotel_db::models::session::{Session, UpdateSession};
use hotel_db::models::Page;

use super::list_filter;
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

/// GET /v1/session/list
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<Session>>> {
    let filter = list_filter(params)?;
    Ok(Json(state.repos.sessions.get_list(&filter).await?))
}

/// GET /v1/session/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.repos.sessions.get_single(id).await?))
}

/// PUT /v1/session
pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<UpdateSession>,
) -> AppResult<Json<Session>> {
    let session = state.repos.sessions.update(&input).await?;
    state.sessions.forget_session(session.id).await;
    Ok(Json(session))
}

/// DELETE /v1/session/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    state.repos.sessions.delete(id).await?;
    state.sessions.forget_session(id).await;
    Ok(StatusCode::NO_CONTENT)
}
