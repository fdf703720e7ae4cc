//! Room review model and DTOs.

use hotel_core::error::CoreError;
use hotel_core::filter::{ColumnKind, ListSpec, SortDirection};
use hotel_core::types::{DbId, Timestamp};
use hotel_core::value::{FieldAccess, FieldValue};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::record::{self, Record};

/// A review row from the `room_reviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoomReview {
    pub id: DbId,
    pub user_id: DbId,
    pub room_id: DbId,
    pub rating: f64,
    pub comment: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new review.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoomReview {
    pub user_id: DbId,
    pub room_id: DbId,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

/// DTO for updating an existing review. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoomReview {
    pub id: DbId,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

static LIST_SPEC: ListSpec = ListSpec {
    search_columns: &["comment"],
    filter_columns: &[("room_id", ColumnKind::Uuid), ("user_id", ColumnKind::Uuid)],
    sort_columns: &["created_at", "updated_at", "rating"],
    default_sort: ("created_at", SortDirection::Desc),
};

impl FieldAccess for RoomReview {
    fn field(&self, column: &str) -> Option<FieldValue> {
        Some(match column {
            "id" => self.id.into(),
            "user_id" => self.user_id.into(),
            "room_id" => self.room_id.into(),
            "rating" => self.rating.into(),
            "comment" => self.comment.as_str().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        })
    }
}

impl Record for RoomReview {
    const ENTITY: &'static str = "room_review";
    const TABLE: &'static str = "room_reviews";
    const COLUMNS: &'static str = "id, user_id, room_id, rating, comment, created_at, updated_at";

    fn id(&self) -> DbId {
        self.id
    }

    fn list_spec() -> &'static ListSpec {
        &LIST_SPEC
    }

    fn insert_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("room_id", self.room_id.into()),
            ("rating", self.rating.into()),
            ("comment", self.comment.as_str().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn assign(&mut self, column: &str, value: &FieldValue) -> Result<(), CoreError> {
        match column {
            "rating" => self.rating = record::float(column, value)?,
            "comment" => self.comment = record::text(column, value)?,
            _ => return Err(record::unknown_column(Self::ENTITY, column)),
        }
        Ok(())
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
