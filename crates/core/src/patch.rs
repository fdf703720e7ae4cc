//! Partial-update merging.
//!
//! Update payloads carry every mutable column as an optional field. The
//! [`UpdateMerger`] decides which of them are real changes and collects those
//! into a [`WriteSet`]; `updated_at` is always refreshed.

use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Timestamp;
use crate::value::FieldValue;

/// Placeholder value some API clients send for untouched string fields.
const PLACEHOLDER_TEXT: &str = "string";

/// How the merger interprets the fields of an update payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchMode {
    /// Zero-ish values mean "leave unchanged": absent, empty or whitespace
    /// strings, the literal `"string"`, `0`, and `false`. In this mode a number
    /// cannot be set to `0` and a flag cannot be set to `false`.
    #[default]
    Sentinel,
    /// Only absent fields are unchanged; every present value is written.
    Explicit,
}

impl FromStr for PatchMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel" => Ok(PatchMode::Sentinel),
            "explicit" => Ok(PatchMode::Explicit),
            other => Err(CoreError::InvalidRequest(format!(
                "unknown patch mode '{other}' (expected 'sentinel' or 'explicit')"
            ))),
        }
    }
}

/// The columns an update will write, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSet {
    pub fields: Vec<(&'static str, FieldValue)>,
    pub updated_at: Timestamp,
}

impl WriteSet {
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(c, _)| *c)
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| v)
    }
}

/// Builder collecting the changed fields of one update payload.
///
/// ```
/// use hotel_core::patch::{PatchMode, UpdateMerger};
///
/// let now = chrono::Utc::now();
/// let set = UpdateMerger::new(PatchMode::Sentinel)
///     .text("status", Some("occupied"))
///     .text("category", Some("string"))
///     .number("price", Some(0.0))
///     .finish("room", now)
///     .unwrap();
/// assert_eq!(set.columns().collect::<Vec<_>>(), vec!["status"]);
/// ```
#[derive(Debug)]
pub struct UpdateMerger {
    mode: PatchMode,
    fields: Vec<(&'static str, FieldValue)>,
}

impl UpdateMerger {
    pub fn new(mode: PatchMode) -> Self {
        Self {
            mode,
            fields: Vec::new(),
        }
    }

    pub fn text(mut self, column: &'static str, value: Option<&str>) -> Self {
        if let Some(v) = value {
            let skip = self.mode == PatchMode::Sentinel
                && (v.trim().is_empty() || v == PLACEHOLDER_TEXT);
            if !skip {
                self.fields.push((column, FieldValue::Text(v.to_string())));
            }
        }
        self
    }

    pub fn number(mut self, column: &'static str, value: Option<f64>) -> Self {
        if let Some(v) = value {
            if !(self.mode == PatchMode::Sentinel && v == 0.0) {
                self.fields.push((column, FieldValue::Float(v)));
            }
        }
        self
    }

    pub fn integer(mut self, column: &'static str, value: Option<i64>) -> Self {
        if let Some(v) = value {
            if !(self.mode == PatchMode::Sentinel && v == 0) {
                self.fields.push((column, FieldValue::Integer(v)));
            }
        }
        self
    }

    pub fn flag(mut self, column: &'static str, value: Option<bool>) -> Self {
        if let Some(v) = value {
            if !(self.mode == PatchMode::Sentinel && !v) {
                self.fields.push((column, FieldValue::Bool(v)));
            }
        }
        self
    }

    /// Finish the merge. Fails with [`CoreError::NoFieldsToUpdate`] when no
    /// field survived, so callers never issue an update that only bumps
    /// `updated_at`.
    pub fn finish(self, entity: &'static str, now: Timestamp) -> Result<WriteSet, CoreError> {
        if self.fields.is_empty() {
            return Err(CoreError::NoFieldsToUpdate { entity });
        }
        Ok(WriteSet {
            fields: self.fields,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn sentinel_mode_skips_zero_values() {
        let set = UpdateMerger::new(PatchMode::Sentinel)
            .text("full_name", Some(""))
            .text("username", Some("   "))
            .text("email", Some("string"))
            .text("phone", None)
            .number("price", Some(0.0))
            .integer("rating", Some(0))
            .flag("availability", Some(false))
            .text("role", Some("staff"))
            .finish("user", Utc::now())
            .unwrap();

        assert_eq!(set.columns().collect::<Vec<_>>(), vec!["role"]);
        assert_eq!(set.get("role"), Some(&FieldValue::Text("staff".into())));
    }

    #[test]
    fn sentinel_mode_keeps_true_flags_and_nonzero_numbers() {
        let set = UpdateMerger::new(PatchMode::Sentinel)
            .number("price", Some(120.5))
            .flag("availability", Some(true))
            .integer("rating", Some(4))
            .finish("room", Utc::now())
            .unwrap();

        assert_eq!(
            set.fields,
            vec![
                ("price", FieldValue::Float(120.5)),
                ("availability", FieldValue::Bool(true)),
                ("rating", FieldValue::Integer(4)),
            ]
        );
    }

    #[test]
    fn explicit_mode_writes_every_present_value() {
        let set = UpdateMerger::new(PatchMode::Explicit)
            .text("comment", Some(""))
            .number("price", Some(0.0))
            .flag("availability", Some(false))
            .text("status", None)
            .finish("room", Utc::now())
            .unwrap();

        assert_eq!(
            set.columns().collect::<Vec<_>>(),
            vec!["comment", "price", "availability"]
        );
    }

    #[test]
    fn nothing_to_write_is_an_error() {
        let err = UpdateMerger::new(PatchMode::Sentinel)
            .text("status", Some("string"))
            .flag("availability", Some(false))
            .finish("room", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::NoFieldsToUpdate { entity: "room" }));
    }

    #[test]
    fn updated_at_is_the_supplied_instant() {
        let now = Utc::now();
        let set = UpdateMerger::new(PatchMode::Explicit)
            .text("status", Some("active"))
            .finish("user", now)
            .unwrap();
        assert_eq!(set.updated_at, now);
    }

    #[test]
    fn patch_mode_parses_case_insensitively() {
        assert_eq!("Explicit".parse::<PatchMode>().unwrap(), PatchMode::Explicit);
        assert_eq!("sentinel".parse::<PatchMode>().unwrap(), PatchMode::Sentinel);
        assert!("loose".parse::<PatchMode>().is_err());
    }
}
