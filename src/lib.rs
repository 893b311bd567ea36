//! # Sieve
//!
//! A schema-driven query compiler: filter strings and column selections in,
//! paged rows, summaries and distinct-value listings out.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Schema description (TOML)                   │
//! │        (tables, columns, metadata, relationships)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema]  built once, shared via Arc
//! ┌─────────────────────────────────────────────────────────┐
//! │   Catalog  →  Registry (uniquenames)  →  Relationships   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!          per request     ▼ [filter] → [compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Predicates → SQL conditions (EXISTS for           │
//! │        related tables, case-folded text matching)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [assemble]
//! ┌─────────────────────────────────────────────────────────┐
//! │     rows / summary / unique values  →  sql::Query        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine] → Executor
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Rows + counts + has_more                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod assemble;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod filter;
pub mod logging;
pub mod response;
pub mod schema;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::assemble::{
        assemble_rows, assemble_summary, assemble_unique_values, Page, PagedQuery, RowsRequest,
        SummaryRequest, UniqueValuesRequest,
    };
    pub use crate::compile::Compiler;
    pub use crate::config::Settings;
    pub use crate::engine::QueryEngine;
    pub use crate::error::{ErrorPayload, QueryError, QueryResult, SchemaError};
    pub use crate::executor::{Executor, Row};
    pub use crate::filter::{parse_filter, FilterSet, Operator, Predicate, Scalar, Value};
    pub use crate::response::{
        ColumnEntry, ColumnsResponse, PagedResponse, ReleaseMetadata, SummaryResponse,
    };
    pub use crate::schema::{Relationship, SchemaMap};
    pub use crate::sql::{Dialect, Query};
}
