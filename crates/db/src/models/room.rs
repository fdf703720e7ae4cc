//! Room entity model and DTOs.

use hotel_core::error::CoreError;
use hotel_core::filter::{ColumnKind, ListSpec, SortDirection};
use hotel_core::types::{DbId, Timestamp};
use hotel_core::value::{FieldAccess, FieldValue};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::record::{self, Record};

/// A room row from the `rooms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    /// Free-form room type, e.g. `single`, `double`, `suite`.
    pub room_type: String,
    /// Free-form category, e.g. `standard`, `deluxe`.
    pub category: String,
    /// Free-form status, e.g. `available`, `occupied`.
    pub status: String,
    pub price: f64,
    pub availability: bool,
    /// Average review rating.
    pub rating: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new room.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoom {
    #[validate(length(min = 1, max = 50))]
    pub room_type: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(min = 1, max = 50))]
    pub status: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub availability: bool,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
}

/// DTO for updating an existing room. Unset fields are left unchanged.
///
/// Text fields carry no minimum length: an empty string is a placeholder in
/// sentinel mode.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoom {
    pub id: DbId,
    #[validate(length(max = 50))]
    pub room_type: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(length(max = 50))]
    pub status: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub availability: Option<bool>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
}

static LIST_SPEC: ListSpec = ListSpec {
    search_columns: &["room_type", "category", "status"],
    filter_columns: &[
        ("room_type", ColumnKind::Text),
        ("category", ColumnKind::Text),
        ("status", ColumnKind::Text),
        ("availability", ColumnKind::Bool),
    ],
    sort_columns: &[
        "created_at",
        "updated_at",
        "price",
        "rating",
        "room_type",
        "category",
    ],
    default_sort: ("created_at", SortDirection::Desc),
};

impl FieldAccess for Room {
    fn field(&self, column: &str) -> Option<FieldValue> {
        Some(match column {
            "id" => self.id.into(),
            "room_type" => self.room_type.as_str().into(),
            "category" => self.category.as_str().into(),
            "status" => self.status.as_str().into(),
            "price" => self.price.into(),
            "availability" => self.availability.into(),
            "rating" => self.rating.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        })
    }
}

impl Record for Room {
    const ENTITY: &'static str = "room";
    const TABLE: &'static str = "rooms";
    const COLUMNS: &'static str = "id, room_type, category, status, price, availability, \
                                   rating, created_at, updated_at";

    fn id(&self) -> DbId {
        self.id
    }

    fn list_spec() -> &'static ListSpec {
        &LIST_SPEC
    }

    fn insert_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", self.id.into()),
            ("room_type", self.room_type.as_str().into()),
            ("category", self.category.as_str().into()),
            ("status", self.status.as_str().into()),
            ("price", self.price.into()),
            ("availability", self.availability.into()),
            ("rating", self.rating.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn assign(&mut self, column: &str, value: &FieldValue) -> Result<(), CoreError> {
        match column {
            "room_type" => self.room_type = record::text(column, value)?,
            "category" => self.category = record::text(column, value)?,
            "status" => self.status = record::text(column, value)?,
            "price" => self.price = record::float(column, value)?,
            "availability" => self.availability = record::flag(column, value)?,
            "rating" => self.rating = record::float(column, value)?,
            _ => return Err(record::unknown_column(Self::ENTITY, column)),
        }
        Ok(())
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
