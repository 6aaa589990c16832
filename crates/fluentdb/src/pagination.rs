//! Offset pagination over a [`QueryBuilder`].
//!
//! [`paginate`] reads page, limit, a free-text search term, per-column
//! filters and per-column sorting from a [`PageRequest`], applies only what
//! the caller's [`ColumnMeta`] allows, and returns the rows together with the
//! page/total response headers.
//!
//! # Example
//!
//! ```ignore
//! use fluentdb::pagination::{paginate, ColumnMeta, PageRequest};
//!
//! let columns = vec![
//!     ColumnMeta::new("name").searchable().sortable(),
//!     ColumnMeta::new("email").searchable().filterable(),
//! ];
//! let request: PageRequest = serde_json::from_str(body)?;
//!
//! let mut qb = db.table("users");
//! let page = paginate(&mut db, &mut qb, &request, &columns).await?;
//! for (name, value) in page.headers.pairs() {
//!     response.header(name, value);
//! }
//! ```

use crate::error::DbResult;
use crate::executor::Executor;
use crate::qb::QueryBuilder;
use crate::row::Row;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

pub const PAGE_HEADER: &str = "x-data-page";
pub const TOTAL_HEADER: &str = "x-data-total";
pub const EXPOSE_HEADERS: &str = "Access-Control-Expose-Headers";

/// Largest page, limit or offset a backend accepts as a bound integer.
const MAX_ROWS: u64 = i64::MAX as u64;

/// Caller-declared capabilities of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub key: String,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub sortable: bool,
}

impl ColumnMeta {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            searchable: false,
            filterable: false,
            sortable: false,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

/// Pagination parameters as they arrive in a request body.
///
/// `page` and `limit` accept numbers or numeric strings; anything missing,
/// non-numeric or below 1 falls back to the defaults. `filters` and
/// `sorting` keep the order they were sent in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    #[serde(deserialize_with = "lenient_count")]
    pub page: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub limit: Option<u64>,
    pub search: Option<String>,
    #[serde(deserialize_with = "ordered_pairs")]
    pub filters: Vec<(String, JsonValue)>,
    #[serde(deserialize_with = "ordered_pairs")]
    pub sorting: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn sort(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sorting.push((column.into(), direction.into()));
        self
    }

    /// Requested page, between 1 and `i64::MAX`.
    pub fn page(&self) -> u64 {
        self.page
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE)
            .min(MAX_ROWS)
    }

    /// Requested page size, between 1 and `i64::MAX`.
    pub fn limit(&self) -> u64 {
        self.limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_ROWS)
    }

    /// Rows skipped before this page, capped at `i64::MAX`.
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit()).min(MAX_ROWS)
    }
}

/// Current page and total row count, sent as response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeaders {
    pub page: u64,
    pub total: i64,
}

impl PageHeaders {
    /// Header name/value pairs, including the CORS expose list.
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            (PAGE_HEADER, self.page.to_string()),
            (TOTAL_HEADER, self.total.to_string()),
            (EXPOSE_HEADERS, format!("{TOTAL_HEADER}, {PAGE_HEADER}")),
        ]
    }
}

/// Response body: the column metadata as given plus the rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBody {
    pub columns: Vec<ColumnMeta>,
    pub data: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub headers: PageHeaders,
    pub body: PageBody,
}

/// Apply search, filters, paging and sorting to `query`, then run it.
///
/// - a non-empty search term adds `col LIKE '%term%'` with OR for every
///   searchable column
/// - each filter on a filterable column adds `col LIKE '%value%'` with AND;
///   filters on other columns are ignored
/// - each sorting entry on a sortable column adds an ORDER BY term
///
/// The total is counted after search and filters, before LIMIT/OFFSET.
pub async fn paginate<E: Executor>(
    conn: &mut E,
    query: &mut QueryBuilder,
    request: &PageRequest,
    columns: &[ColumnMeta],
) -> DbResult<Page> {
    let page = request.page();
    let limit = request.limit();

    if let Some(term) = request.search.as_deref().filter(|t| !t.is_empty()) {
        for column in columns.iter().filter(|c| c.searchable) {
            query.or_where(&column.key, "LIKE", format!("%{term}%"))?;
        }
    }

    for (key, value) in &request.filters {
        if is_allowed(columns, key, |c| c.filterable) {
            query.where_(key, "LIKE", format!("%{}%", filter_text(value)))?;
        }
    }

    let total = query.count(conn).await?;
    debug!(
        target: "fluentdb.pagination",
        page,
        limit,
        total,
        "paginating"
    );

    query.limit(limit)?.offset(request.offset())?;

    for (key, direction) in &request.sorting {
        if is_allowed(columns, key, |c| c.sortable) {
            query.order_by(key, direction)?;
        }
    }

    let data = query.get(conn).await?;

    Ok(Page {
        headers: PageHeaders { page, total },
        body: PageBody {
            columns: columns.to_vec(),
            data,
        },
    })
}

fn is_allowed(columns: &[ColumnMeta], key: &str, flag: impl Fn(&ColumnMeta) -> bool) -> bool {
    columns.iter().any(|c| c.key == key && flag(c))
}

fn filter_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match raw {
        Some(JsonValue::Number(n)) => n.as_u64(),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Deserialize a JSON object into key/value pairs in document order.
fn ordered_pairs<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct PairsVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(pair) = map.next_entry::<String, V>()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_any(PairsVisitor(PhantomData))
}
