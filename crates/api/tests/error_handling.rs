//! `AppError` to HTTP response mapping.
//!
//! These call `IntoResponse` directly; no router is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use hotel_api::error::AppError;
use hotel_core::error::CoreError;
use hotel_db::DbError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_returns_404() {
    let err = AppError::Core(CoreError::not_found("room", "42"));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "room with id 42 not found");
}

#[tokio::test]
async fn invalid_request_returns_400() {
    let err = AppError::Core(CoreError::InvalidRequest("sort_by 'x' is not allowed".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_REQUEST");
    assert_eq!(json["error"], "sort_by 'x' is not allowed");
}

#[tokio::test]
async fn no_fields_to_update_returns_400() {
    let err = AppError::Core(CoreError::NoFieldsToUpdate { entity: "room" });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NO_FIELDS_TO_UPDATE");
}

#[tokio::test]
async fn unauthorized_and_forbidden() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("no token".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("denied".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_from_storage_returns_409() {
    let err = AppError::from(DbError::Duplicate {
        entity: "user",
        column: "email",
    });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "A user with this email already exists");
}

#[tokio::test]
async fn core_error_inside_db_error_keeps_its_status() {
    let err = AppError::from(DbError::Core(CoreError::NoFieldsToUpdate { entity: "user" }));
    let (status, _) = error_to_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pool_failure_is_sanitized_500() {
    let err = AppError::Database(sqlx::Error::PoolTimedOut);
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let err = AppError::Core(CoreError::Internal("connection string leaked".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}
