//! Typed column values exchanged between the filter compiler, the update
//! merger and the storage backends.

use std::cmp::Ordering;

use crate::types::{DbId, Timestamp};

/// A single column value.
///
/// Backends bind these as query parameters (PostgreSQL) or compare them
/// directly (in-memory store), so every variant maps to one SQL type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Uuid(DbId),
    Timestamp(Timestamp),
}

impl FieldValue {
    /// The text payload, if this is a [`FieldValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Total order used for in-process sorting.
    ///
    /// Integers and floats compare numerically with each other; any other
    /// mismatched pair compares equal so the caller's tie-breaker decides.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Integer(a), Float(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
            (Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Uuid(a), Uuid(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DbId> for FieldValue {
    fn from(value: DbId) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Read access to a record's columns by name.
///
/// Implemented by every model so predicates and sort orders can be evaluated
/// without a database.
pub trait FieldAccess {
    /// Value of `column`, or `None` if the record has no such column.
    fn field(&self, column: &str) -> Option<FieldValue>;
}
