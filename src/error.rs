//! Error types for schema loading and query compilation.
//!
//! Build-time failures ([`SchemaError`]) abort startup; no partial schema map
//! is ever served. Per-request failures ([`QueryError`]) are local and
//! recoverable: they carry structured fields and render to the message text
//! clients see through [`ErrorPayload`].

use serde::Serialize;

/// Errors raised while loading and validating the schema description.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse schema file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to fingerprint schema: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error("Schema declares no tables")]
    NoTables,

    #[error("Table '{table}' declares no columns")]
    EmptyTable { table: String },

    #[error("Table '{table}' is declared more than once")]
    DuplicateTable { table: String },

    #[error("Column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Identity column '{column}' of table '{table}' does not exist")]
    MissingIdentity { table: String, column: String },

    #[error("Column '{table}.{column}' references unknown column '{target}'")]
    BadReference {
        table: String,
        column: String,
        target: String,
    },

    #[error("Table '{table}' counts '{target}', which is not an entity table")]
    BadRelatedCount { table: String, target: String },

    #[error("Column name '{name}' is produced by more than one column")]
    UniquenameCollision { name: String },

    #[error("Relationship error between '{entity}' and '{foreign}': {reason}")]
    Relationship {
        entity: String,
        foreign: String,
        reason: String,
    },
}

/// Errors raised while compiling or executing a request.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Column Not Found: {name}{}", format_candidates(.candidates))]
    ColumnNotFound {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Table Not Found: {table}")]
    TableNotFound { table: String },

    #[error("Unable to find relationship between {entity} and {foreign}")]
    RelationshipNotFound { entity: String, foreign: String },

    #[error("Parsing Error: {reason} in filter '{filter}'")]
    Parsing { filter: String, reason: String },

    #[error("system: {system} - not found")]
    SystemNotFound { system: String },

    #[error("Operator '{operator}' not compatible with value '{value}': {expected}")]
    OperatorValueMismatch {
        operator: String,
        value: String,
        expected: String,
    },

    #[error("No columns left to select from '{table}'")]
    NoColumnsSelected { table: String },

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Query timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Result alias for request-level operations.
pub type QueryResult<T> = Result<T, QueryError>;

fn format_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        let quoted: Vec<String> = candidates.iter().map(|c| format!("'{c}'")).collect();
        format!(", did you mean: [{}]", quoted.join(", "))
    }
}

impl QueryError {
    /// Build a [`QueryError::Parsing`] for `filter`.
    pub fn parsing(filter: &str, reason: impl Into<String>) -> Self {
        QueryError::Parsing {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the caller supplied bad input, as opposed to an execution fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Execution(_) | QueryError::Timeout { .. })
    }
}

/// Serializable error body handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl From<&QueryError> for ErrorPayload {
    fn from(err: &QueryError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}
