//! Schema map: catalog, column registry and relationship index.
//!
//! Built once at startup and shared read-only (behind an `Arc`) by every
//! request. Construction either fully succeeds or fails with a
//! [`SchemaError`]; there is no partially built map.

pub mod catalog;
pub mod raw;
pub mod registry;
pub mod relationship;
pub mod types;

pub use catalog::{
    Catalog, ColumnDescriptor, ColumnMetadata, RelationshipDecl, TableDescriptor, DATA_SOURCE_TAG,
};
pub use raw::{RawColumn, RawColumnMeta, RawRelationship, RawSchema, RawTable};
pub use registry::Registry;
pub use relationship::{Relationship, RelationshipIndex};
pub use types::{ColumnKey, DataType, ValueKind};

use std::path::Path;

use tracing::info;

use crate::error::SchemaError;

#[derive(Debug, Clone)]
pub struct SchemaMap {
    pub catalog: Catalog,
    pub registry: Registry,
    pub relationships: RelationshipIndex,
}

impl SchemaMap {
    pub fn build(raw: RawSchema) -> Result<Self, SchemaError> {
        let catalog = Catalog::build(raw)?;
        let registry = Registry::build(&catalog);
        let relationships = RelationshipIndex::build(&catalog)?;

        for table in catalog.entity_tables() {
            if let Some(target) = &table.related_count {
                if relationships.get(&table.name, target).is_err() {
                    return Err(SchemaError::Relationship {
                        entity: table.name.clone(),
                        foreign: target.clone(),
                        reason: "related_count target is not related".into(),
                    });
                }
            }
        }

        info!(
            version = catalog.version(),
            tables = catalog.tables().len(),
            columns = registry.len(),
            relationships = relationships.len(),
            "Schema map loaded"
        );

        Ok(Self {
            catalog,
            registry,
            relationships,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, SchemaError> {
        Self::build(RawSchema::from_toml(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
