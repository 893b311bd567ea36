//! Serde model of the TOML schema description.
//!
//! ```toml
//! version = "4.0.0"
//!
//! [[tables]]
//! name = "subject"
//! identity = "id_alias"
//! related_count = "file"
//!
//! [[tables.columns]]
//! name = "species"
//! type = "text"
//! meta = { kind = "categorical", summary = true, fetch = true }
//!
//! [[relationships]]
//! entity = "subject"
//! foreign = "file"
//! remote_side = ["file_describes_subject.subject_alias", "file_describes_subject.file_alias"]
//! ```

use serde::{Deserialize, Serialize};

use super::types::{DataType, ValueKind};

/// Root of a schema description file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSchema {
    pub version: String,
    #[serde(default)]
    pub tables: Vec<RawTable>,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub name: String,
    /// Identity column; its presence marks an entity table.
    #[serde(default)]
    pub identity: Option<String>,
    /// Entity table counted in this table's summaries.
    #[serde(default)]
    pub related_count: Option<String>,
    #[serde(default)]
    pub columns: Vec<RawColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Foreign keys as `"table.column"`.
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub meta: Option<RawColumnMeta>,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawColumnMeta {
    pub kind: Option<ValueKind>,
    pub summary: bool,
    pub fetch: bool,
    pub process: Option<String>,
    pub virtual_table: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelationship {
    pub entity: String,
    pub foreign: String,
    /// Local column of a direct relationship, `"table.column"`.
    #[serde(default)]
    pub local: Option<String>,
    /// One column: direct. Two columns: junction table.
    #[serde(default)]
    pub remote_side: Vec<String>,
}

impl RawSchema {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
