//! In-process backend.
//!
//! Keeps rows in a `Vec` behind a tokio `RwLock` and evaluates predicates with
//! [`Predicate::matches`]. Unique columns declared by the model are enforced
//! on insert and update; foreign keys are not, so cascades are left to the
//! repositories.

use std::cmp::Ordering;

use async_trait::async_trait;
use hotel_core::filter::{ListQuery, Predicate, SortDirection};
use hotel_core::patch::WriteSet;
use hotel_core::types::DbId;
use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};
use crate::record::Record;
use crate::store::RecordStore;

/// [`RecordStore`] holding every row in memory.
pub struct MemoryStore<R> {
    rows: RwLock<Vec<R>>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reject `candidate` if another row already holds one of its unique values.
fn check_unique<R: Record>(rows: &[R], candidate: &R) -> DbResult<()> {
    for &column in R::UNIQUE {
        let Some(value) = candidate.field(column) else {
            continue;
        };
        let taken = rows
            .iter()
            .any(|row| row.id() != candidate.id() && row.field(column).as_ref() == Some(&value));
        if taken {
            return Err(DbError::Duplicate {
                entity: R::ENTITY,
                column,
            });
        }
    }
    Ok(())
}

/// Ordering equivalent to `ORDER BY {column} {direction} , id ASC` with
/// PostgreSQL's default null placement.
fn sort_order<R: Record>(a: &R, b: &R, column: &str, direction: SortDirection) -> Ordering {
    let primary = match (a.field(column), b.field(column)) {
        (Some(x), Some(y)) => x.compare(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id().cmp(&b.id()))
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn insert(&self, record: &R) -> DbResult<R> {
        let mut rows = self.rows.write().await;
        check_unique(&rows, record)?;
        rows.push(record.clone());
        Ok(record.clone())
    }

    async fn find_one(&self, predicate: &Predicate) -> DbResult<Option<R>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| predicate.matches(*row))
            .min_by(|a, b| sort_order(*a, *b, "created_at", SortDirection::Asc))
            .cloned())
    }

    async fn fetch_page(&self, query: &ListQuery) -> DbResult<Vec<R>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<&R> = rows
            .iter()
            .filter(|row| query.predicate.matches(*row))
            .collect();
        matched.sort_by(|a, b| sort_order(*a, *b, query.sort_by, query.direction));

        let offset = usize::try_from(query.window.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.window.limit()).unwrap_or(0);
        Ok(matched.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        let rows = self.rows.read().await;
        let total = rows.iter().filter(|row| predicate.matches(*row)).count();
        Ok(total as i64)
    }

    async fn apply(&self, id: DbId, writes: &WriteSet) -> DbResult<bool> {
        let mut rows = self.rows.write().await;
        let Some(pos) = rows.iter().position(|row| row.id() == id) else {
            return Ok(false);
        };

        let mut updated = rows[pos].clone();
        for (column, value) in &writes.fields {
            updated.assign(column, value)?;
        }
        updated.set_updated_at(writes.updated_at);
        check_unique(&rows, &updated)?;

        rows[pos] = updated;
        Ok(true)
    }

    async fn delete(&self, id: DbId) -> DbResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        Ok(rows.len() < before)
    }

    async fn delete_where(&self, predicate: &Predicate) -> DbResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !predicate.matches(row));
        Ok((before - rows.len()) as u64)
    }
}
