//! PostgreSQL backend.
//!
//! Statements are assembled from the model's static table/column constants
//! and the compiled [`ListQuery`]; every value travels as a bind parameter.

use std::marker::PhantomData;

use async_trait::async_trait;
use hotel_core::filter::{ListQuery, Predicate};
use hotel_core::patch::WriteSet;
use hotel_core::types::DbId;
use hotel_core::value::FieldValue;

use crate::error::DbResult;
use crate::record::Record;
use crate::store::RecordStore;
use crate::DbPool;

/// Bind each [`FieldValue`] in order onto any sqlx query builder
/// (`query`, `query_as` or `query_scalar`).
macro_rules! bind_values {
    ($query:expr, $bind_values:expr) => {{
        let mut q = $query;
        for val in $bind_values {
            q = match val {
                FieldValue::Text(v) => q.bind(v.as_str()),
                FieldValue::Integer(v) => q.bind(*v),
                FieldValue::Float(v) => q.bind(*v),
                FieldValue::Bool(v) => q.bind(*v),
                FieldValue::Uuid(v) => q.bind(*v),
                FieldValue::Timestamp(v) => q.bind(*v),
            };
        }
        q
    }};
}

/// [`RecordStore`] over a PostgreSQL pool.
pub struct PgStore<R> {
    pool: DbPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> PgStore<R> {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for PgStore<R> {
    async fn insert(&self, record: &R) -> DbResult<R> {
        let values = record.insert_values();
        let (query, bind_values) = insert_statement(R::TABLE, R::COLUMNS, &values);
        let row = bind_values!(sqlx::query_as::<_, R>(&query), &bind_values)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_one(&self, predicate: &Predicate) -> DbResult<Option<R>> {
        let (query, bind_values) = find_one_statement(R::TABLE, R::COLUMNS, predicate);
        let row = bind_values!(sqlx::query_as::<_, R>(&query), &bind_values)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn fetch_page(&self, list: &ListQuery) -> DbResult<Vec<R>> {
        let (query, bind_values) = page_statement(R::TABLE, R::COLUMNS, list);
        let rows = bind_values!(sqlx::query_as::<_, R>(&query), &bind_values)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(table = R::TABLE, rows = rows.len(), "Fetched page");
        Ok(rows)
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        let (query, bind_values) = count_statement(R::TABLE, predicate);
        let total = bind_values!(sqlx::query_scalar::<_, i64>(&query), &bind_values)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn apply(&self, id: DbId, writes: &WriteSet) -> DbResult<bool> {
        let (query, bind_values) = update_statement(R::TABLE, id, writes);
        let result = bind_values!(sqlx::query(&query), &bind_values)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: DbId) -> DbResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", R::TABLE);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, predicate: &Predicate) -> DbResult<u64> {
        let (query, bind_values) = delete_statement(R::TABLE, predicate);
        let result = bind_values!(sqlx::query(&query), &bind_values)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Statement builders
// ---------------------------------------------------------------------------

/// Build a WHERE clause and bind values from a predicate.
///
/// Returns `(where_clause, bind_values, next_bind_index)`. The clause is
/// empty when the predicate is empty, otherwise it starts with `WHERE `. This
/// is the only place a [`Predicate`] becomes SQL, so the page and count
/// statements always agree.
pub(crate) fn build_where(predicate: &Predicate, first_idx: u32) -> (String, Vec<FieldValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = first_idx;
    let mut bind_values: Vec<FieldValue> = Vec::new();

    for (column, value) in &predicate.exact {
        conditions.push(format!("{column} = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(value.clone());
    }

    if let Some(search) = &predicate.search {
        let alternatives: Vec<String> = search
            .columns
            .iter()
            .map(|column| format!("{column} ILIKE ${bind_idx}"))
            .collect();
        conditions.push(format!("({})", alternatives.join(" OR ")));
        bind_idx += 1;
        bind_values.push(FieldValue::Text(search.like_pattern()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

pub(crate) fn page_statement(
    table: &str,
    columns: &str,
    list: &ListQuery,
) -> (String, Vec<FieldValue>) {
    let (where_clause, mut bind_values, bind_idx) = build_where(&list.predicate, 1);
    let query = format!(
        "SELECT {columns} FROM {table} {where_clause} \
         ORDER BY {} {}, id ASC \
         LIMIT ${bind_idx} OFFSET ${}",
        list.sort_by,
        list.direction.as_sql(),
        bind_idx + 1
    );
    bind_values.push(FieldValue::Integer(list.window.limit()));
    bind_values.push(FieldValue::Integer(list.window.offset()));
    (query, bind_values)
}

pub(crate) fn count_statement(table: &str, predicate: &Predicate) -> (String, Vec<FieldValue>) {
    let (where_clause, bind_values, _) = build_where(predicate, 1);
    (format!("SELECT COUNT(*) FROM {table} {where_clause}"), bind_values)
}

pub(crate) fn delete_statement(table: &str, predicate: &Predicate) -> (String, Vec<FieldValue>) {
    let (where_clause, bind_values, _) = build_where(predicate, 1);
    (format!("DELETE FROM {table} {where_clause}"), bind_values)
}

pub(crate) fn find_one_statement(
    table: &str,
    columns: &str,
    predicate: &Predicate,
) -> (String, Vec<FieldValue>) {
    let (where_clause, bind_values, _) = build_where(predicate, 1);
    let query = format!(
        "SELECT {columns} FROM {table} {where_clause} ORDER BY created_at ASC, id ASC LIMIT 1"
    );
    (query, bind_values)
}

pub(crate) fn insert_statement(
    table: &str,
    returning: &str,
    values: &[(&'static str, FieldValue)],
) -> (String, Vec<FieldValue>) {
    let names: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${i}")).collect();
    let query = format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING {returning}",
        names.join(", "),
        placeholders.join(", ")
    );
    (query, values.iter().map(|(_, v)| v.clone()).collect())
}

pub(crate) fn update_statement(
    table: &str,
    id: DbId,
    writes: &WriteSet,
) -> (String, Vec<FieldValue>) {
    let mut sets: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<FieldValue> = Vec::new();

    for (column, value) in &writes.fields {
        sets.push(format!("{column} = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(value.clone());
    }

    sets.push(format!("updated_at = ${bind_idx}"));
    bind_idx += 1;
    bind_values.push(FieldValue::Timestamp(writes.updated_at));

    let query = format!(
        "UPDATE {table} SET {} WHERE id = ${bind_idx}",
        sets.join(", ")
    );
    bind_values.push(FieldValue::Uuid(id));
    (query, bind_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hotel_core::filter::{compile, ListFilter};
    use hotel_core::patch::{PatchMode, UpdateMerger};

    use crate::models::room::Room;

    fn room_query(filter: ListFilter) -> ListQuery {
        compile(Room::list_spec(), &filter).unwrap()
    }

    #[test]
    fn empty_predicate_renders_no_where_clause() {
        let (clause, binds, next) = build_where(&Predicate::default(), 1);
        assert!(clause.is_empty());
        assert!(binds.is_empty());
        assert_eq!(next, 1);
    }

    #[test]
    fn page_and_count_share_the_same_predicate() {
        let list = room_query(
            ListFilter::new()
                .with_search("deluxe")
                .with_filter("status", "available")
                .with_page(2, 5),
        );

        let (page_sql, page_binds) = page_statement(Room::TABLE, Room::COLUMNS, &list);
        let (count_sql, count_binds) = count_statement(Room::TABLE, &list.predicate);

        let expected_where = "WHERE status = $1 AND \
                              (room_type ILIKE $2 OR category ILIKE $2 OR status ILIKE $2)";
        assert!(page_sql.contains(expected_where), "{page_sql}");
        assert!(count_sql.contains(expected_where), "{count_sql}");
        assert!(page_sql.ends_with("ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4"));

        assert_eq!(&page_binds[..2], &count_binds[..]);
        assert_eq!(
            &page_binds[2..],
            &[FieldValue::Integer(5), FieldValue::Integer(5)]
        );
    }

    #[test]
    fn search_term_is_bound_as_escaped_pattern() {
        let list = room_query(ListFilter::new().with_search("50%"));
        let (_, binds) = count_statement(Room::TABLE, &list.predicate);
        assert_eq!(binds, vec![FieldValue::Text(r"%50\%%".into())]);
    }

    #[test]
    fn update_sets_fields_then_updated_at_then_filters_by_id() {
        let now = Utc::now();
        let id = hotel_core::types::new_id();
        let writes = UpdateMerger::new(PatchMode::Sentinel)
            .number("price", Some(150.0))
            .text("status", Some("occupied"))
            .finish("room", now)
            .unwrap();

        let (sql, binds) = update_statement("rooms", id, &writes);
        assert_eq!(
            sql,
            "UPDATE rooms SET price = $1, status = $2, updated_at = $3 WHERE id = $4"
        );
        assert_eq!(binds.len(), 4);
        assert_eq!(binds[2], FieldValue::Timestamp(now));
        assert_eq!(binds[3], FieldValue::Uuid(id));
    }

    #[test]
    fn insert_lists_columns_and_placeholders_in_order() {
        let values = vec![
            ("id", FieldValue::Uuid(hotel_core::types::new_id())),
            ("comment", FieldValue::Text("quiet".into())),
        ];
        let (sql, binds) = insert_statement("room_reviews", "id, comment", &values);
        assert_eq!(
            sql,
            "INSERT INTO room_reviews (id, comment) VALUES ($1, $2) RETURNING id, comment"
        );
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn delete_statement_filters_by_predicate() {
        let user_id = hotel_core::types::new_id();
        let (sql, binds) = delete_statement("sessions", &Predicate::eq("user_id", user_id));
        assert_eq!(sql, "DELETE FROM sessions WHERE user_id = $1");
        assert_eq!(binds, vec![FieldValue::Uuid(user_id)]);
    }

    #[test]
    fn find_one_orders_oldest_first() {
        let (sql, binds) =
            find_one_statement("users", "id", &Predicate::eq("email", "a@b.io"));
        assert_eq!(
            sql,
            "SELECT id FROM users WHERE email = $1 ORDER BY created_at ASC, id ASC LIMIT 1"
        );
        assert_eq!(binds, vec![FieldValue::Text("a@b.io".into())]);
    }
}
