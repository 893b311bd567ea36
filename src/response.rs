//! Response bodies handed back to the transport layer.

use serde::Serialize;

use crate::executor::Row;
use crate::schema::{DataType, SchemaMap};

/// Description used for columns without one in the schema.
pub const UNSET_DESCRIPTION: &str = "unset";

/// Paged row or distinct-value result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedResponse {
    pub result: Vec<Row>,
    /// `None` when the caller did not ask for the total.
    pub total_row_count: Option<u64>,
    pub has_more: bool,
    pub query_sql: String,
}

impl PagedResponse {
    /// `has_more` holds when rows remain past this page.
    pub fn new(result: Vec<Row>, total: u64, offset: u64, report_total: bool, query_sql: String) -> Self {
        let seen = offset.saturating_add(result.len() as u64);
        Self {
            has_more: total > seen,
            total_row_count: report_total.then_some(total),
            result,
            query_sql,
        }
    }
}

/// A single synthetic summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub result: Vec<Row>,
    pub query_sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnEntry {
    pub table: String,
    /// The column's uniquename.
    pub column: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnsResponse {
    pub result: Vec<ColumnEntry>,
}

impl ColumnsResponse {
    /// Every non-identity column of every entity table.
    pub fn from_schema(schema: &SchemaMap) -> Self {
        let result = schema
            .catalog
            .entity_tables()
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .filter(move |c| table.identity.as_deref() != Some(c.name.as_str()))
            })
            .map(|c| ColumnEntry {
                table: c.table.clone(),
                column: c.uniquename.clone(),
                data_type: c.data_type,
                nullable: c.nullable,
                description: c
                    .metadata
                    .description
                    .clone()
                    .unwrap_or_else(|| UNSET_DESCRIPTION.to_string()),
            })
            .collect();
        Self { result }
    }
}

/// Version information about the loaded schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseMetadata {
    pub version: String,
    pub fingerprint: String,
    /// Entity tables, in declaration order.
    pub tables: Vec<String>,
}

impl ReleaseMetadata {
    pub fn from_schema(schema: &SchemaMap) -> Self {
        Self {
            version: schema.catalog.version().to_string(),
            fingerprint: schema.catalog.fingerprint().to_string(),
            tables: schema
                .catalog
                .entity_tables()
                .map(|t| t.name.clone())
                .collect(),
        }
    }
}
