//! Storage backend abstraction.

use async_trait::async_trait;
use hotel_core::filter::{ListQuery, Predicate};
use hotel_core::patch::WriteSet;
use hotel_core::types::DbId;

use crate::error::DbResult;
use crate::record::Record;

/// Row-level operations a repository needs from a backend.
///
/// `fetch_page` and `count` receive the same [`Predicate`]; implementations
/// must evaluate it identically for both.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Insert a fully built record and return the persisted row.
    async fn insert(&self, record: &R) -> DbResult<R>;

    /// First record matching `predicate`, oldest first.
    async fn find_one(&self, predicate: &Predicate) -> DbResult<Option<R>>;

    async fn fetch_page(&self, query: &ListQuery) -> DbResult<Vec<R>>;

    async fn count(&self, predicate: &Predicate) -> DbResult<i64>;

    /// Apply a write set to the record with `id`. Returns `false` if no such
    /// record exists.
    async fn apply(&self, id: DbId, writes: &WriteSet) -> DbResult<bool>;

    /// Returns `false` if no such record exists.
    async fn delete(&self, id: DbId) -> DbResult<bool>;

    /// Delete every record matching `predicate` and return how many went.
    async fn delete_where(&self, predicate: &Predicate) -> DbResult<u64>;
}
