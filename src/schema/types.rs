//! Scalar vocabularies shared by the schema description and the catalog.

use serde::{Deserialize, Serialize};

/// Declared storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Timestamp,
    Json,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::Json => "json",
        }
    }

    /// Text columns get case-insensitive comparison.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Text)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a column is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// min / max / mean / median / quartiles
    Numeric,
    /// grouped distinct-value counts
    Categorical,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValueKind::Numeric => "numeric",
            ValueKind::Categorical => "categorical",
        })
    }
}

/// A `table.column` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub table: String,
    pub column: String,
}

impl ColumnKey {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Parse `"table.column"`. Both halves must be non-empty.
    pub fn parse(s: &str) -> Option<Self> {
        let (table, column) = s.split_once('.')?;
        let (table, column) = (table.trim(), column.trim());
        if table.is_empty() || column.is_empty() || column.contains('.') {
            return None;
        }
        Some(Self::new(table, column))
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
