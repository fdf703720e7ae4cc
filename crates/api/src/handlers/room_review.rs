//! Handlers for the `/room-review` resource.

use axum::extract::State;
use axum::http::StatusCode;
use hotel_core::roles::ROLE_GUEST;
use hotel_core::types::DbId;
use hotel_db::models::room_review::{CreateRoomReview, RoomReview, UpdateRoomReview};
use hotel_db::models::Page;
use serde::Deserialize;

use super::list_filter;
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /v1/room-review`.
///
/// Guests always review as themselves; other roles may name the author and
/// default to themselves.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub user_id: Option<DbId>,
    pub room_id: DbId,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewLookup {
    pub id: DbId,
}

/// POST /v1/room-review
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<RoomReview>)> {
    let author = match input.user_id {
        Some(id) if user.role != ROLE_GUEST => id,
        _ => user.user_id,
    };
    let review = state
        .repos
        .room_reviews
        .create(&CreateRoomReview {
            user_id: author,
            room_id: input.room_id,
            rating: input.rating,
            comment: input.comment,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /v1/room-review/list
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<RoomReview>>> {
    let filter = list_filter(params)?;
    Ok(Json(state.repos.room_reviews.get_list(&filter).await?))
}

/// GET /v1/room-review/single?id=
pub async fn get_single(
    State(state): State<AppState>,
    Query(lookup): Query<ReviewLookup>,
) -> AppResult<Json<RoomReview>> {
    Ok(Json(state.repos.room_reviews.get_single(lookup.id).await?))
}

/// GET /v1/room-review/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<RoomReview>> {
    Ok(Json(state.repos.room_reviews.get_single(id).await?))
}

/// PUT /v1/room-review
pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<UpdateRoomReview>,
) -> AppResult<Json<RoomReview>> {
    Ok(Json(state.repos.room_reviews.update(&input).await?))
}

/// DELETE /v1/room-review/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    state.repos.room_reviews.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
