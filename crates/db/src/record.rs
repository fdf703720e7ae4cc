//! The [`Record`] trait tying a model to its table and list rules.

use hotel_core::error::CoreError;
use hotel_core::filter::ListSpec;
use hotel_core::types::{DbId, Timestamp};
use hotel_core::value::{FieldAccess, FieldValue};
use sqlx::postgres::PgRow;
use sqlx::FromRow;

/// A persisted entity.
///
/// Table and column names are compile-time constants; they are the only
/// identifiers storage backends ever interpolate into SQL.
pub trait Record:
    FieldAccess + Clone + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, PgRow>
{
    /// Entity name used in error messages (`"user"`, `"room"`).
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Comma-separated select list in struct field order.
    const COLUMNS: &'static str;
    /// Columns carrying a unique constraint.
    const UNIQUE: &'static [&'static str] = &[];

    fn id(&self) -> DbId;

    /// Search, filter and sort allow-lists for list endpoints.
    fn list_spec() -> &'static ListSpec;

    /// Column/value pairs for an INSERT. Absent optional columns are left out
    /// so the database default (`NULL`) applies.
    fn insert_values(&self) -> Vec<(&'static str, FieldValue)>;

    /// Overwrite one column in place (in-memory backend).
    fn assign(&mut self, column: &str, value: &FieldValue) -> Result<(), CoreError>;

    fn set_updated_at(&mut self, at: Timestamp);
}

// ---------------------------------------------------------------------------
// Helpers for `Record::assign` implementations
// ---------------------------------------------------------------------------

fn mismatch(column: &str, expected: &str, value: &FieldValue) -> CoreError {
    CoreError::Internal(format!(
        "column '{column}' expects {expected}, got {value:?}"
    ))
}

pub(crate) fn unknown_column(entity: &str, column: &str) -> CoreError {
    CoreError::Internal(format!("{entity} has no writable column '{column}'"))
}

pub(crate) fn text(column: &str, value: &FieldValue) -> Result<String, CoreError> {
    match value {
        FieldValue::Text(s) => Ok(s.clone()),
        other => Err(mismatch(column, "text", other)),
    }
}

pub(crate) fn float(column: &str, value: &FieldValue) -> Result<f64, CoreError> {
    match value {
        FieldValue::Float(v) => Ok(*v),
        FieldValue::Integer(v) => Ok(*v as f64),
        other => Err(mismatch(column, "a number", other)),
    }
}

pub(crate) fn flag(column: &str, value: &FieldValue) -> Result<bool, CoreError> {
    match value {
        FieldValue::Bool(v) => Ok(*v),
        other => Err(mismatch(column, "a boolean", other)),
    }
}

pub(crate) fn timestamp(column: &str, value: &FieldValue) -> Result<Timestamp, CoreError> {
    match value {
        FieldValue::Timestamp(v) => Ok(*v),
        other => Err(mismatch(column, "a timestamp", other)),
    }
}
