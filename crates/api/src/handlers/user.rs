//! Handlers for the `/user` resource.

use axum::extract::State;
use axum::http::StatusCode;
use hotel_core::roles::{ROLE_GUEST, STATUS_PENDING};
use hotel_core::types::DbId;
use hotel_db::models::user::{CreateUser, UpdateUser, User, UserLookup};
use hotel_db::models::Page;
use serde::Deserialize;

use super::list_filter;
use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

/// Request body for `POST /v1/user`. The password arrives in plaintext and
/// is hashed before storage.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub user_type: String,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub gender: String,
}

/// Hash `password` after checking its strength.
pub(crate) fn hash_new_password(password: &str) -> AppResult<String> {
    validate_password_strength(password, MIN_PASSWORD_LENGTH).map_err(AppError::BadRequest)?;
    hash_password(password).map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// POST /v1/user
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let password_hash = hash_new_password(&input.password)?;
    let user = state
        .repos
        .users
        .create(&CreateUser {
            full_name: input.full_name,
            username: input.username,
            email: input.email,
            phone: input.phone,
            password_hash,
            user_type: input.user_type,
            role: input.role.unwrap_or_else(|| ROLE_GUEST.to_string()),
            status: input.status.unwrap_or_else(|| STATUS_PENDING.to_string()),
            gender: input.gender,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/user/list
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Page<User>>> {
    let filter = list_filter(params)?;
    Ok(Json(state.repos.users.get_list(&filter).await?))
}

/// GET /v1/user/single?id=|email=|role=
pub async fn get_single(
    State(state): State<AppState>,
    Query(lookup): Query<UserLookup>,
) -> AppResult<Json<User>> {
    Ok(Json(state.repos.users.get_single(&lookup).await?))
}

/// GET /v1/user/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<User>> {
    let lookup = UserLookup {
        id: Some(id),
        ..UserLookup::default()
    };
    Ok(Json(state.repos.users.get_single(&lookup).await?))
}

/// PUT /v1/user
pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    let user = state.repos.users.update(&input).await?;
    state.sessions.forget_user(user.id).await;
    Ok(Json(user))
}

/// DELETE /v1/user/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    state.repos.delete_user(id).await?;
    state.sessions.forget_user(id).await;
    Ok(StatusCode::NO_CONTENT)
}
