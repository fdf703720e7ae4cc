//! Handlers for the `/room` resource.

use axum::extract::State;
use axum::http::StatusCode;
use hotel_core::types::DbId;
use hotel_db::models::room::{CreateRoom, Room, UpdateRoom};
use hotel_db::models::Page;
use serde::Deserialize;

use super::list_filter;
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoomLookup {
    pub id: DbId,
}

/// POST /v1/room
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateRoom>,
) -> AppResult<(StatusCode, Json<Room>)> {
    let room = state.repos.rooms.create(&input).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /v1/room/list
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<Room>>> {
    let filter = list_filter(params)?;
    Ok(Json(state.repos.rooms.get_list(&filter).await?))
}

/// GET /v1/room/single?id=
pub async fn get_single(
    State(state): State<AppState>,
    Query(lookup): Query<RoomLookup>,
) -> AppResult<Json<Room>> {
    Ok(Json(state.repos.rooms.get_single(lookup.id).await?))
}

/// GET /v1/room/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Room>> {
    Ok(Json(state.repos.rooms.get_single(id).await?))
}

/// PUT /v1/room
pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<UpdateRoom>,
) -> AppResult<Json<Room>> {
    Ok(Json(state.repos.rooms.update(&input).await?))
}

/// DELETE /v1/room/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    state.repos.rooms.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
