//! Immutable table/column catalog built from a [`RawSchema`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::raw::{RawColumn, RawRelationship, RawSchema, RawTable};
use super::registry::assign_uniquenames;
use super::types::{ColumnKey, DataType, ValueKind};
use crate::error::{QueryError, QueryResult, SchemaError};

/// `process` tag marking a per-source coverage flag column.
pub const DATA_SOURCE_TAG: &str = "data_source";

/// Per-column display and aggregation flags.
///
/// Columns without metadata default every flag to off: selectable but
/// neither fetched by default nor summarized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub kind: Option<ValueKind>,
    pub summary: bool,
    pub fetch: bool,
    pub process: Option<String>,
    pub virtual_table: Option<String>,
    pub description: Option<String>,
}

impl ColumnMetadata {
    pub fn is_data_source(&self) -> bool {
        self.process.as_deref() == Some(DATA_SOURCE_TAG)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub table: String,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Registry-wide unique name.
    pub uniquename: String,
    pub references: Vec<ColumnKey>,
    pub metadata: ColumnMetadata,
}

impl ColumnDescriptor {
    pub fn key(&self) -> ColumnKey {
        ColumnKey::new(&self.table, &self.name)
    }
}

/// A declared relationship, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDecl {
    pub entity: String,
    pub foreign: String,
    pub local: Option<ColumnKey>,
    pub remote_side: Vec<ColumnKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub identity: Option<String>,
    pub related_count: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    /// Relationships declared with this table as the entity side.
    pub relationships: Vec<RelationshipDecl>,
}

impl TableDescriptor {
    /// Entity tables are the ones requests can target.
    pub fn is_entity(&self) -> bool {
        self.identity.is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The identity column, if this is an entity table.
    pub fn identity_column(&self) -> Option<&ColumnDescriptor> {
        self.identity.as_deref().and_then(|name| self.column(name))
    }
}

/// The loaded schema: tables in declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    fingerprint: String,
    tables: Vec<TableDescriptor>,
    table_index: HashMap<String, usize>,
}

impl Catalog {
    /// Validate and normalize a raw description.
    pub fn build(raw: RawSchema) -> Result<Self, SchemaError> {
        if raw.tables.is_empty() {
            return Err(SchemaError::NoTables);
        }

        let fingerprint = compute_hash(&raw)?;
        let table_index = index_tables(&raw.tables)?;
        let known = known_columns(&raw.tables)?;

        for table in &raw.tables {
            validate_table(table, &known, &raw.tables, &table_index)?;
        }

        let uniquenames = assign_uniquenames(
            raw.tables
                .iter()
                .flat_map(|t| t.columns.iter().map(move |c| (t.name.as_str(), c.name.as_str()))),
        )?;

        let mut relationships_by_entity: HashMap<&str, Vec<RelationshipDecl>> = HashMap::new();
        for rel in &raw.relationships {
            let decl = relationship_decl(rel, &known)?;
            relationships_by_entity
                .entry(rel.entity.as_str())
                .or_default()
                .push(decl);
        }
        for rel in &raw.relationships {
            if !table_index.contains_key(&rel.entity) || !table_index.contains_key(&rel.foreign) {
                let missing = if table_index.contains_key(&rel.entity) {
                    &rel.foreign
                } else {
                    &rel.entity
                };
                return Err(SchemaError::Relationship {
                    entity: rel.entity.clone(),
                    foreign: rel.foreign.clone(),
                    reason: format!("unknown table '{missing}'"),
                });
            }
        }

        let tables = raw
            .tables
            .iter()
            .map(|t| TableDescriptor {
                name: t.name.clone(),
                identity: t.identity.clone(),
                related_count: t.related_count.clone(),
                columns: t
                    .columns
                    .iter()
                    .map(|c| column_descriptor(&t.name, c, &uniquenames))
                    .collect(),
                relationships: relationships_by_entity
                    .remove(t.name.as_str())
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        debug!(
            version = %raw.version,
            tables = tables.len(),
            "Catalog built"
        );

        Ok(Self {
            version: raw.version,
            fingerprint,
            tables,
            table_index,
        })
    }

    /// Parse and build from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SchemaError> {
        Self::build(RawSchema::from_toml(content)?)
    }

    /// Schema description version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 (hex) of the canonical JSON form of the raw description.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn entity_tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter().filter(|t| t.is_entity())
    }

    pub fn table(&self, name: &str) -> QueryResult<&TableDescriptor> {
        self.table_index
            .get(name)
            .map(|&i| &self.tables[i])
            .ok_or_else(|| QueryError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Look up an entity table; non-entity tables are reported as not found.
    pub fn entity_table(&self, name: &str) -> QueryResult<&TableDescriptor> {
        let table = self.table(name)?;
        if table.is_entity() {
            Ok(table)
        } else {
            Err(QueryError::TableNotFound {
                table: name.to_string(),
            })
        }
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&ColumnDescriptor> {
        self.table_index
            .get(&key.table)
            .and_then(|&i| self.tables[i].column(&key.column))
    }
}

/// Compute SHA256 hash of a serializable value.
///
/// The value is serialized to JSON before hashing, ensuring deterministic output.
/// Returns a 64-character lowercase hexadecimal string.
fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn index_tables(tables: &[RawTable]) -> Result<HashMap<String, usize>, SchemaError> {
    let mut index = HashMap::with_capacity(tables.len());
    for (i, table) in tables.iter().enumerate() {
        if index.insert(table.name.clone(), i).is_some() {
            return Err(SchemaError::DuplicateTable {
                table: table.name.clone(),
            });
        }
    }
    Ok(index)
}

fn known_columns(tables: &[RawTable]) -> Result<HashSet<ColumnKey>, SchemaError> {
    let mut known = HashSet::new();
    for table in tables {
        if table.columns.is_empty() {
            return Err(SchemaError::EmptyTable {
                table: table.name.clone(),
            });
        }
        for column in &table.columns {
            if !known.insert(ColumnKey::new(&table.name, &column.name)) {
                return Err(SchemaError::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }
    Ok(known)
}

fn validate_table(
    table: &RawTable,
    known: &HashSet<ColumnKey>,
    tables: &[RawTable],
    table_index: &HashMap<String, usize>,
) -> Result<(), SchemaError> {
    if let Some(identity) = &table.identity {
        if !known.contains(&ColumnKey::new(&table.name, identity)) {
            return Err(SchemaError::MissingIdentity {
                table: table.name.clone(),
                column: identity.clone(),
            });
        }
    }

    if let Some(target) = &table.related_count {
        let is_entity = table_index
            .get(target)
            .is_some_and(|&i| tables[i].identity.is_some());
        if !is_entity {
            return Err(SchemaError::BadRelatedCount {
                table: table.name.clone(),
                target: target.clone(),
            });
        }
    }

    for column in &table.columns {
        for target in &column.references {
            let resolves = ColumnKey::parse(target).is_some_and(|key| known.contains(&key));
            if !resolves {
                return Err(SchemaError::BadReference {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    Ok(())
}

fn relationship_decl(
    rel: &RawRelationship,
    known: &HashSet<ColumnKey>,
) -> Result<RelationshipDecl, SchemaError> {
    let resolve = |raw: &str| -> Result<ColumnKey, SchemaError> {
        ColumnKey::parse(raw)
            .filter(|key| known.contains(key))
            .ok_or_else(|| SchemaError::Relationship {
                entity: rel.entity.clone(),
                foreign: rel.foreign.clone(),
                reason: format!("unknown column '{raw}'"),
            })
    };

    Ok(RelationshipDecl {
        entity: rel.entity.clone(),
        foreign: rel.foreign.clone(),
        local: rel.local.as_deref().map(resolve).transpose()?,
        remote_side: rel
            .remote_side
            .iter()
            .map(|raw| resolve(raw))
            .collect::<Result<_, _>>()?,
    })
}

fn column_descriptor(
    table: &str,
    column: &RawColumn,
    uniquenames: &HashMap<ColumnKey, String>,
) -> ColumnDescriptor {
    let key = ColumnKey::new(table, &column.name);
    let meta = column.meta.clone().unwrap_or_default();
    ColumnDescriptor {
        table: table.to_string(),
        name: column.name.clone(),
        data_type: column.data_type,
        nullable: column.nullable,
        uniquename: uniquenames
            .get(&key)
            .cloned()
            .unwrap_or_else(|| column.name.clone()),
        // Validated above, so every entry parses.
        references: column
            .references
            .iter()
            .filter_map(|r| ColumnKey::parse(r))
            .collect(),
        metadata: ColumnMetadata {
            kind: meta.kind,
            summary: meta.summary,
            fetch: meta.fetch,
            process: meta.process,
            virtual_table: meta.virtual_table,
            description: meta.description,
        },
    }
}
