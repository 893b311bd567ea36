//! Query assembly.
//!
//! Three request shapes, each built from the shared `filter_preselect`
//! CTE (the entity rows that satisfy the request's filters):
//!
//! - [`rows`]: paged entity rows, with foreign columns aggregated per
//!   foreign table so one-to-many joins never fan out entity rows.
//! - [`summary`]: one synthetic row of counts and per-column aggregates.
//! - [`unique_values`]: paged distinct values of one column.
//!
//! Paged shapes come with a count query computed from the unpaginated
//! preselection.

pub mod preselect;
pub mod rows;
pub mod summary;
pub mod unique_values;

pub use rows::{assemble_rows, RowsRequest};
pub use summary::{assemble_summary, SummaryRequest};
pub use unique_values::{assemble_unique_values, UniqueValuesRequest};

use crate::sql::{Dialect, Query};

/// Requested window over a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Page {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    pub(crate) fn apply(&self, mut query: Query) -> Query {
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if self.offset > 0 {
            query = query.offset(self.offset);
        }
        query
    }
}

/// A paged query together with the query counting all of its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQuery {
    pub query: Query,
    pub count: Query,
}

impl PagedQuery {
    /// Render `(query, count)`.
    pub fn to_sql(&self, dialect: Dialect) -> (String, String) {
        (self.query.to_sql(dialect), self.count.to_sql(dialect))
    }
}
