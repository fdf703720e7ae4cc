//! List filter compiler.
//!
//! Turns the loosely-typed list parameters of a request (`search`, exact
//! filters, `page`, `page_size`, `sort_by`, `sort_order`) into a [`ListQuery`]
//! validated against a per-entity [`ListSpec`]. The resulting [`Predicate`] is
//! the single source of truth for both the page fetch and the total count;
//! backends must render it through one code path for both queries.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::value::{FieldAccess, FieldValue};

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Page used when the request does not specify one.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

// ---------------------------------------------------------------------------
// Per-entity description
// ---------------------------------------------------------------------------

/// Sort direction of the page query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CoreError::InvalidRequest(format!(
                "sort_order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// How a raw filter string is parsed for a given column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Uuid,
    Bool,
    Integer,
    Float,
}

impl ColumnKind {
    fn parse(self, column: &str, raw: &str) -> Result<FieldValue, CoreError> {
        let invalid = |what: &str| {
            CoreError::InvalidRequest(format!("filter '{column}' expects {what}, got '{raw}'"))
        };
        match self {
            ColumnKind::Text => Ok(FieldValue::Text(raw.to_string())),
            ColumnKind::Uuid => raw
                .parse::<uuid::Uuid>()
                .map(FieldValue::Uuid)
                .map_err(|_| invalid("a UUID")),
            ColumnKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(FieldValue::Bool(true)),
                "false" | "0" => Ok(FieldValue::Bool(false)),
                _ => Err(invalid("a boolean")),
            },
            ColumnKind::Integer => raw
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid("an integer")),
            ColumnKind::Float => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| invalid("a number")),
        }
    }
}

/// Allow-lists describing what a list endpoint may search, filter and sort.
///
/// Column names here are the only identifiers ever interpolated into SQL.
#[derive(Debug)]
pub struct ListSpec {
    /// Text columns matched by the free-text `search` parameter (ORed).
    pub search_columns: &'static [&'static str],
    /// Columns accepted as exact-match filters (ANDed).
    pub filter_columns: &'static [(&'static str, ColumnKind)],
    /// Columns accepted by `sort_by`.
    pub sort_columns: &'static [&'static str],
    /// Ordering used when `sort_by` is omitted.
    pub default_sort: (&'static str, SortDirection),
}

// ---------------------------------------------------------------------------
// Request-side filter
// ---------------------------------------------------------------------------

/// Raw list parameters as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub search: Option<String>,
    /// Entity-specific exact-match filters, keyed by column name.
    pub filters: BTreeMap<String, String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from query-string pairs.
    ///
    /// `page`, `page_size` (alias `limit`), `search`, `sort_by` and
    /// `sort_order` are recognised; every other key is treated as an
    /// exact-match filter and validated later by [`compile`].
    pub fn from_params<I, K, V>(params: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut filter = Self::default();
        for (key, value) in params {
            let key = key.into();
            let value = value.into();
            match key.as_str() {
                "page" => filter.page = Some(parse_int("page", &value)?),
                "page_size" | "limit" => filter.page_size = Some(parse_int(&key, &value)?),
                "search" => filter.search = Some(value),
                "sort_by" => filter.sort_by = Some(value),
                "sort_order" => filter.sort_order = Some(value),
                _ => {
                    filter.filters.insert(key, value);
                }
            }
        }
        Ok(filter)
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(sort_order.into());
        self
    }
}

fn parse_int(name: &str, raw: &str) -> Result<i64, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::InvalidRequest(format!("{name} must be an integer, got '{raw}'")))
}

// ---------------------------------------------------------------------------
// Compiled query
// ---------------------------------------------------------------------------

/// Case-insensitive substring search across several text columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    pub columns: &'static [&'static str],
    pub term: String,
}

impl TextSearch {
    /// `ILIKE` pattern for the term with `\`, `%` and `_` escaped.
    pub fn like_pattern(&self) -> String {
        let mut escaped = String::with_capacity(self.term.len() + 2);
        escaped.push('%');
        for c in self.term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        escaped
    }

    fn matches(&self, record: &impl FieldAccess) -> bool {
        let needle = self.term.to_lowercase();
        self.columns.iter().any(|col| {
            record
                .field(col)
                .and_then(|v| v.as_text().map(|s| s.to_lowercase().contains(&needle)))
                .unwrap_or(false)
        })
    }
}

/// The filter condition shared by the page query and the count query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    /// Exact-match conditions, combined with AND.
    pub exact: Vec<(&'static str, FieldValue)>,
    /// Optional free-text condition, ANDed with `exact`.
    pub search: Option<TextSearch>,
}

impl Predicate {
    /// A predicate with a single equality condition.
    pub fn eq(column: &'static str, value: impl Into<FieldValue>) -> Self {
        Self::default().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.exact.push((column, value.into()));
        self
    }

    /// Whether the predicate places no restriction on rows.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.search.is_none()
    }

    /// Evaluate the predicate against an in-memory record.
    pub fn matches(&self, record: &impl FieldAccess) -> bool {
        let exact_ok = self
            .exact
            .iter()
            .all(|(col, expected)| record.field(col).as_ref() == Some(expected));
        exact_ok && self.search.as_ref().is_none_or(|s| s.matches(record))
    }
}

/// A 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub page_size: i64,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// A validated list request, ready for a storage backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub predicate: Predicate,
    pub sort_by: &'static str,
    pub direction: SortDirection,
    pub window: PageWindow,
}

/// Validate `filter` against `spec` and produce the query plan.
///
/// Fails with [`CoreError::InvalidRequest`] on an unknown sort column, an
/// unknown filter key, an unparseable filter value, or a bad sort order.
/// Empty filter values and an empty search term are dropped rather than
/// compared against `""`.
pub fn compile(spec: &ListSpec, filter: &ListFilter) -> Result<ListQuery, CoreError> {
    let requested_sort = filter
        .sort_by
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (sort_by, default_direction) = match requested_sort {
        Some(requested) => {
            let column = spec
                .sort_columns
                .iter()
                .copied()
                .find(|c| *c == requested)
                .ok_or_else(|| {
                    CoreError::InvalidRequest(format!(
                        "cannot sort by '{requested}'; allowed: {}",
                        spec.sort_columns.join(", ")
                    ))
                })?;
            (column, SortDirection::Asc)
        }
        None => spec.default_sort,
    };

    let direction = match filter.sort_order.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => SortDirection::parse(raw)?,
        _ => default_direction,
    };

    let mut exact = Vec::new();
    for (key, raw) in &filter.filters {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let (column, kind) = spec
            .filter_columns
            .iter()
            .copied()
            .find(|(c, _)| c == key)
            .ok_or_else(|| CoreError::InvalidRequest(format!("unknown filter '{key}'")))?;
        exact.push((column, kind.parse(column, raw)?));
    }

    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && !spec.search_columns.is_empty())
        .map(|term| TextSearch {
            columns: spec.search_columns,
            term: term.to_string(),
        });

    let window = PageWindow {
        page: filter.page.unwrap_or(DEFAULT_PAGE).max(1),
        page_size: clamp_limit(filter.page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
    };

    Ok(ListQuery {
        predicate: Predicate { exact, search },
        sort_by,
        direction,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    static SPEC: ListSpec = ListSpec {
        search_columns: &["name", "category"],
        filter_columns: &[
            ("status", ColumnKind::Text),
            ("available", ColumnKind::Bool),
            ("floor", ColumnKind::Integer),
        ],
        sort_columns: &["created_at", "name", "price"],
        default_sort: ("created_at", SortDirection::Desc),
    };

    struct Row(HashMap<&'static str, FieldValue>);

    impl FieldAccess for Row {
        fn field(&self, column: &str) -> Option<FieldValue> {
            self.0.get(column).cloned()
        }
    }

    fn row(name: &str, category: &str, status: &str) -> Row {
        Row(HashMap::from([
            ("name", FieldValue::from(name)),
            ("category", FieldValue::from(category)),
            ("status", FieldValue::from(status)),
            ("available", FieldValue::from(true)),
        ]))
    }

    // -- clamp_limit ---------------------------------------------------------

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(clamp_limit(None, 10, 100), 10);
    }

    #[test]
    fn clamp_limit_respects_max_and_floor() {
        assert_eq!(clamp_limit(Some(500), 10, 100), 100);
        assert_eq!(clamp_limit(Some(0), 10, 100), 1);
        assert_eq!(clamp_limit(Some(-3), 10, 100), 1);
    }

    // -- from_params ---------------------------------------------------------

    #[test]
    fn from_params_splits_known_keys_from_filters() {
        let f = ListFilter::from_params([
            ("page", "2"),
            ("limit", "25"),
            ("search", "sea view"),
            ("sort_by", "price"),
            ("sort_order", "asc"),
            ("status", "available"),
        ])
        .unwrap();

        assert_eq!(f.page, Some(2));
        assert_eq!(f.page_size, Some(25));
        assert_eq!(f.search.as_deref(), Some("sea view"));
        assert_eq!(f.sort_by.as_deref(), Some("price"));
        assert_eq!(f.filters.get("status").map(String::as_str), Some("available"));
        assert_eq!(f.filters.len(), 1);
    }

    #[test]
    fn from_params_rejects_non_numeric_page() {
        let err = ListFilter::from_params([("page", "two")]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }

    // -- compile -------------------------------------------------------------

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let q = compile(&SPEC, &ListFilter::new()).unwrap();
        assert!(q.predicate.is_empty());
        assert_eq!(q.sort_by, "created_at");
        assert_eq!(q.direction, SortDirection::Desc);
        assert_eq!(q.window, PageWindow { page: 1, page_size: DEFAULT_PAGE_SIZE });
        assert_eq!(q.window.offset(), 0);
    }

    #[test]
    fn page_and_size_are_clamped() {
        let q = compile(&SPEC, &ListFilter::new().with_page(0, 10_000)).unwrap();
        assert_eq!(q.window.page, 1);
        assert_eq!(q.window.page_size, MAX_PAGE_SIZE);

        let q = compile(&SPEC, &ListFilter::new().with_page(3, 20)).unwrap();
        assert_eq!(q.window.offset(), 40);
        assert_eq!(q.window.limit(), 20);
    }

    #[test]
    fn sort_field_outside_allow_list_is_rejected() {
        let filter = ListFilter::new().with_sort("password_hash; DROP TABLE users", "asc");
        let err = compile(&SPEC, &filter).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(msg) if msg.contains("cannot sort by")));
    }

    #[test]
    fn explicit_sort_defaults_to_ascending() {
        let filter = ListFilter {
            sort_by: Some("price".into()),
            ..ListFilter::default()
        };
        let q = compile(&SPEC, &filter).unwrap();
        assert_eq!(q.sort_by, "price");
        assert_eq!(q.direction, SortDirection::Asc);
    }

    #[test]
    fn bad_sort_order_is_rejected() {
        let err = compile(&SPEC, &ListFilter::new().with_sort("name", "sideways")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }

    #[test]
    fn filters_are_typed_and_empty_values_omitted() {
        let filter = ListFilter::new()
            .with_filter("status", "available")
            .with_filter("available", "false")
            .with_filter("floor", "  ");
        let q = compile(&SPEC, &filter).unwrap();

        assert_eq!(
            q.predicate.exact,
            vec![
                ("available", FieldValue::Bool(false)),
                ("status", FieldValue::Text("available".into())),
            ]
        );
    }

    #[test]
    fn unknown_filter_and_bad_values_are_rejected() {
        let err = compile(&SPEC, &ListFilter::new().with_filter("password", "x")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(msg) if msg.contains("unknown filter")));

        let err = compile(&SPEC, &ListFilter::new().with_filter("floor", "third")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(msg) if msg.contains("integer")));
    }

    #[test]
    fn blank_search_is_dropped() {
        let q = compile(&SPEC, &ListFilter::new().with_search("   ")).unwrap();
        assert!(q.predicate.search.is_none());
    }

    // -- Predicate -----------------------------------------------------------

    #[test]
    fn search_is_case_insensitive_and_ored_across_columns() {
        let q = compile(&SPEC, &ListFilter::new().with_search("DeLuxe")).unwrap();
        assert!(q.predicate.matches(&row("Room 1", "deluxe", "available")));
        assert!(q.predicate.matches(&row("Deluxe corner", "standard", "available")));
        assert!(!q.predicate.matches(&row("Room 2", "standard", "available")));
    }

    #[test]
    fn exact_filters_are_anded_with_search() {
        let filter = ListFilter::new()
            .with_search("deluxe")
            .with_filter("status", "occupied");
        let q = compile(&SPEC, &filter).unwrap();
        assert!(q.predicate.matches(&row("A", "deluxe", "occupied")));
        assert!(!q.predicate.matches(&row("B", "deluxe", "available")));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        let search = TextSearch {
            columns: &["name"],
            term: r"50%_off\".to_string(),
        };
        assert_eq!(search.like_pattern(), r"%50\%\_off\\%");
    }
}
