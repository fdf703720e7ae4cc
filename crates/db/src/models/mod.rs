//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - A `Deserialize` update DTO (`id` plus `Option` fields) for patches

use serde::Serialize;

pub mod room;
pub mod room_review;
pub mod session;
pub mod user;

/// One page of a filtered list together with the total match count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows matching the filter across all pages.
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}
