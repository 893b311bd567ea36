//! Storage boundary.
//!
//! The engine never talks to a database directly. It renders SQL and hands
//! it to an [`Executor`], which owns connection handling and returns rows as
//! insertion-ordered JSON maps keyed by output column name.

use async_trait::async_trait;

use crate::error::QueryResult;

/// One result row, `uniquename -> value`, in select-list order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Executes rendered SQL against the backing store.
///
/// Implementations report failures as [`QueryError::Execution`]; the
/// engine applies the timeout around each call.
///
/// [`QueryError::Execution`]: crate::error::QueryError::Execution
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a query and return every row.
    async fn fetch_rows(&self, sql: &str) -> QueryResult<Vec<Row>>;

    /// Run a single-value count query.
    async fn fetch_count(&self, sql: &str) -> QueryResult<i64>;
}
