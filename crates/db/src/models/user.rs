//! User entity model and DTOs.

use hotel_core::error::CoreError;
use hotel_core::filter::{ColumnKind, ListSpec, SortDirection};
use hotel_core::roles::{ROLE_GUEST, STATUS_PENDING};
use hotel_core::types::{DbId, Timestamp};
use hotel_core::value::{FieldAccess, FieldValue};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::record::{self, Record};

/// Full user row from the `users` table.
///
/// `password_hash` is skipped during serialization so the row can be
/// returned from handlers as is.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_type: String,
    pub role: String,
    pub status: String,
    pub gender: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user. The password is already hashed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: String,
    pub password_hash: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub gender: String,
}

fn default_role() -> String {
    ROLE_GUEST.to_string()
}

fn default_status() -> String {
    STATUS_PENDING.to_string()
}

/// DTO for updating an existing user. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub id: DbId,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_type: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub gender: Option<String>,
}

/// Identifying fields for a single-user lookup. The first present one is
/// used, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLookup {
    pub id: Option<DbId>,
    pub email: Option<String>,
    pub role: Option<String>,
}

static LIST_SPEC: ListSpec = ListSpec {
    search_columns: &["full_name", "username", "email", "phone"],
    filter_columns: &[
        ("role", ColumnKind::Text),
        ("status", ColumnKind::Text),
        ("user_type", ColumnKind::Text),
        ("gender", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("username", ColumnKind::Text),
    ],
    sort_columns: &["created_at", "updated_at", "full_name", "username", "email"],
    default_sort: ("created_at", SortDirection::Desc),
};

impl FieldAccess for User {
    fn field(&self, column: &str) -> Option<FieldValue> {
        Some(match column {
            "id" => self.id.into(),
            "full_name" => self.full_name.as_str().into(),
            "username" => self.username.as_str().into(),
            "email" => self.email.as_str().into(),
            "phone" => self.phone.as_str().into(),
            "password_hash" => self.password_hash.as_str().into(),
            "user_type" => self.user_type.as_str().into(),
            "role" => self.role.as_str().into(),
            "status" => self.status.as_str().into(),
            "gender" => self.gender.as_str().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        })
    }
}

impl Record for User {
    const ENTITY: &'static str = "user";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, full_name, username, email, phone, password_hash, \
                                   user_type, role, status, gender, created_at, updated_at";
    const UNIQUE: &'static [&'static str] = &["username", "email"];

    fn id(&self) -> DbId {
        self.id
    }

    fn list_spec() -> &'static ListSpec {
        &LIST_SPEC
    }

    fn insert_values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", self.id.into()),
            ("full_name", self.full_name.as_str().into()),
            ("username", self.username.as_str().into()),
            ("email", self.email.as_str().into()),
            ("phone", self.phone.as_str().into()),
            ("password_hash", self.password_hash.as_str().into()),
            ("user_type", self.user_type.as_str().into()),
            ("role", self.role.as_str().into()),
            ("status", self.status.as_str().into()),
            ("gender", self.gender.as_str().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }

    fn assign(&mut self, column: &str, value: &FieldValue) -> Result<(), CoreError> {
        let slot = match column {
            "full_name" => &mut self.full_name,
            "username" => &mut self.username,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "password_hash" => &mut self.password_hash,
            "user_type" => &mut self.user_type,
            "role" => &mut self.role,
            "status" => &mut self.status,
            "gender" => &mut self.gender,
            _ => return Err(record::unknown_column(Self::ENTITY, column)),
        };
        *slot = record::text(column, value)?;
        Ok(())
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
