//! Login session model and DTOs.

use hotel_core::error::CoreError;
use hotel_core::filter::{ColumnKind, ListSpec, SortDirection};
use hotel_core::types::{DbId, Timestamp};
use hotel_core::value::{FieldAccess, FieldValue};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::record::{self, Record};

/// A session row from the `sessions` table.
///
/// Only the SHA-256 digest of the bearer token is stored; it is never
/// serialized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub role: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub is_active: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    /// Active and not yet expired at `now`.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.is_active && self.expires_at > now
    }
}

/// DTO for creating a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: DbId,
    pub role: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// DTO for updating an existing session. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSession {
    pub id: DbId,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

static LIST_SPEC: ListSpec = ListSpec {
    search_columns: &["role", "user_agent", "ip_address"],
    filter_columns: &[
        ("user_id", ColumnKind::Uuid),
        ("role", ColumnKind::Text),
        ("is_active", ColumnKind::Bool),
    ],
    sort_columns: &["created_at", "updated_at", "issued_at", "expires_at"],
    default_sort: ("created_at", SortDirection::Desc),
};

impl FieldAccess for Session {
    fn field(&self, column: &str) -> Option<FieldValue> {
        Some(match column {
            "id" => self.id.into(),
            "user_id" => self.user_id.into(),
            "role" => self.role.as_str().into(),
            "token_hash" => self.token_hash.as_str().into(),
            "is_active" => self.is_active.into(),
            "user_agent" => self.user_agent.as_deref()?.into(),
            "ip_address" => self.ip_address.as_deref()?.into(),
            "issued_at" => self.issued_at.into(),
            "expires_at" => self.expires_at.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        })
    }
}

impl Record for Session {
    const ENTITY: &'static str = "session";
    const TABLE: &'static str = "sessions";
    const COLUMNS: &'static str = "id, user_id, role, token_hash, is_active, user_agent, \
                                   ip_address, issued_at, expires_at, created_at, updated_at";
    const UNIQUE: &'static [&'static str] = &["token_hash"];

    fn id(&self) -> DbId {
        self.id
    }

    fn list_spec() -> &'static ListSpec {
        &LIST_SPEC
    }

    fn insert_values(&self) -> Vec<(&'static str, FieldValue)> {
        let mut values = vec![
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("role", self.role.as_str().into()),
            ("token_hash", self.token_hash.as_str().into()),
            ("is_active", self.is_active.into()),
            ("issued_at", self.issued_at.into()),
            ("expires_at", self.expires_at.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ];
        if let Some(agent) = &self.user_agent {
            values.push(("user_agent", agent.as_str().into()));
        }
        if let Some(ip) = &self.ip_address {
            values.push(("ip_address", ip.as_str().into()));
        }
        values
    }

    fn assign(&mut self, column: &str, value: &FieldValue) -> Result<(), CoreError> {
        match column {
            "role" => self.role = record::text(column, value)?,
            "is_active" => self.is_active = record::flag(column, value)?,
            "user_agent" => self.user_agent = Some(record::text(column, value)?),
            "ip_address" => self.ip_address = Some(record::text(column, value)?),
            "expires_at" => self.expires_at = record::timestamp(column, value)?,
            _ => return Err(record::unknown_column(Self::ENTITY, column)),
        }
        Ok(())
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
