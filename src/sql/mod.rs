//! SQL generation module.
//!
//! A small, type-safe SQL builder that renders PostgreSQL and DuckDB:
//!
//! - [`query`] - SELECT query builder (CTEs, joins, derived tables)
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    and_all, array_agg_distinct_non_null, avg, coalesce, col, count_distinct, count_star,
    exists, func, json_agg, json_object, lit_bool, lit_float, lit_int, lit_null, lit_str, max,
    min, or_any, percentile_cont, star, table_col, upper, BinaryOperator, Expr, ExprExt, Literal,
    UnaryOperator,
};
pub use query::{
    Cte, Join, JoinType, LimitOffset, NullsOrder, OrderByExpr, Query, SelectExpr, SortDir,
    TableRef, TableSource,
};
pub use token::{Token, TokenStream};
