//! Relationship resolution between entity tables.
//!
//! Every declared relationship is resolved once into a [`Relationship`]:
//! either a direct foreign key or a path through a junction (mapping) table.
//! The results live in a directed graph keyed by entity name, one edge per
//! ordered `(entity, foreign)` pair.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::catalog::{Catalog, RelationshipDecl};
use super::types::ColumnKey;
use crate::error::{QueryError, QueryResult, SchemaError};

/// A resolved join path from an entity table to a foreign entity table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    /// `entity_column` on the entity table joins `foreign_column` on the
    /// foreign table.
    Direct {
        entity_column: ColumnKey,
        foreign_column: ColumnKey,
    },
    /// Two foreign keys held by `mapping_table`:
    /// `entity_mapping_column -> entity_column` and
    /// `foreign_mapping_column -> foreign_column`.
    Junction {
        mapping_table: String,
        entity_column: ColumnKey,
        entity_mapping_column: ColumnKey,
        foreign_column: ColumnKey,
        foreign_mapping_column: ColumnKey,
    },
}

impl Relationship {
    pub fn entity_column(&self) -> &ColumnKey {
        match self {
            Relationship::Direct { entity_column, .. }
            | Relationship::Junction { entity_column, .. } => entity_column,
        }
    }

    pub fn foreign_column(&self) -> &ColumnKey {
        match self {
            Relationship::Direct { foreign_column, .. }
            | Relationship::Junction { foreign_column, .. } => foreign_column,
        }
    }

    /// Mapping-table column referencing the entity side. `None` if direct.
    pub fn entity_mapping_column(&self) -> Option<&ColumnKey> {
        match self {
            Relationship::Direct { .. } => None,
            Relationship::Junction {
                entity_mapping_column,
                ..
            } => Some(entity_mapping_column),
        }
    }

    /// Mapping-table column referencing the foreign side. `None` if direct.
    pub fn foreign_mapping_column(&self) -> Option<&ColumnKey> {
        match self {
            Relationship::Direct { .. } => None,
            Relationship::Junction {
                foreign_mapping_column,
                ..
            } => Some(foreign_mapping_column),
        }
    }

    pub fn mapping_table(&self) -> Option<&str> {
        match self {
            Relationship::Direct { .. } => None,
            Relationship::Junction { mapping_table, .. } => Some(mapping_table),
        }
    }

    pub fn is_junction(&self) -> bool {
        matches!(self, Relationship::Junction { .. })
    }

    /// The same path seen from the foreign side.
    pub fn reversed(&self) -> Self {
        match self {
            Relationship::Direct {
                entity_column,
                foreign_column,
            } => Relationship::Direct {
                entity_column: foreign_column.clone(),
                foreign_column: entity_column.clone(),
            },
            Relationship::Junction {
                mapping_table,
                entity_column,
                entity_mapping_column,
                foreign_column,
                foreign_mapping_column,
            } => Relationship::Junction {
                mapping_table: mapping_table.clone(),
                entity_column: foreign_column.clone(),
                entity_mapping_column: foreign_mapping_column.clone(),
                foreign_column: entity_column.clone(),
                foreign_mapping_column: entity_mapping_column.clone(),
            },
        }
    }
}

/// Resolved relationships for every ordered pair of related entities.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    graph: DiGraph<String, Relationship>,
    node_index: HashMap<String, NodeIndex>,
}

impl RelationshipIndex {
    /// Resolve every declared relationship of `catalog`.
    pub fn build(catalog: &Catalog) -> Result<Self, SchemaError> {
        let mut explicit: Vec<((String, String), Relationship)> = Vec::new();

        for table in catalog.tables() {
            for decl in &table.relationships {
                if decl.entity == decl.foreign {
                    debug!(entity = %decl.entity, "Skipping self-relationship");
                    continue;
                }
                for side in [&decl.entity, &decl.foreign] {
                    let is_entity = catalog.table(side).map(|t| t.is_entity()).unwrap_or(false);
                    if !is_entity {
                        return Err(relationship_error(
                            decl,
                            format!("'{side}' is not an entity table"),
                        ));
                    }
                }

                let resolved = resolve(catalog, decl)?;
                let pair = (decl.entity.clone(), decl.foreign.clone());
                match explicit.iter_mut().find(|(p, _)| *p == pair) {
                    None => explicit.push((pair, resolved)),
                    Some((_, existing)) => match (existing.is_junction(), resolved.is_junction()) {
                        (true, false) => *existing = resolved,
                        (false, true) => {}
                        _ => {
                            return Err(relationship_error(
                                decl,
                                "declared more than once with the same kind".into(),
                            ));
                        }
                    },
                }
            }
        }

        let mut index = Self::default();
        for table in catalog.entity_tables() {
            let node = index.graph.add_node(table.name.clone());
            index.node_index.insert(table.name.clone(), node);
        }

        for ((entity, foreign), rel) in &explicit {
            index.insert(entity, foreign, rel.clone());
        }
        for ((entity, foreign), rel) in &explicit {
            let declared = explicit.iter().any(|((e, f), _)| e == foreign && f == entity);
            if !declared {
                index.insert(foreign, entity, rel.reversed());
            }
        }

        debug!(
            entities = index.graph.node_count(),
            relationships = index.graph.edge_count(),
            "Relationship index built"
        );
        Ok(index)
    }

    fn insert(&mut self, entity: &str, foreign: &str, rel: Relationship) {
        if let (Some(&from), Some(&to)) = (self.node_index.get(entity), self.node_index.get(foreign))
        {
            self.graph.add_edge(from, to, rel);
        }
    }

    /// The join path from `entity` to `foreign`.
    pub fn get(&self, entity: &str, foreign: &str) -> QueryResult<&Relationship> {
        let not_found = || QueryError::RelationshipNotFound {
            entity: entity.to_string(),
            foreign: foreign.to_string(),
        };
        let from = self.node_index.get(entity).ok_or_else(not_found)?;
        let to = self.node_index.get(foreign).ok_or_else(not_found)?;
        let edge = self.graph.find_edge(*from, *to).ok_or_else(not_found)?;
        self.graph.edge_weight(edge).ok_or_else(not_found)
    }

    /// Entities reachable from `entity` in one hop.
    pub fn related(&self, entity: &str) -> Vec<&str> {
        let Some(&node) = self.node_index.get(entity) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors(node)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of resolved ordered pairs.
    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

fn relationship_error(decl: &RelationshipDecl, reason: String) -> SchemaError {
    SchemaError::Relationship {
        entity: decl.entity.clone(),
        foreign: decl.foreign.clone(),
        reason,
    }
}

fn resolve(catalog: &Catalog, decl: &RelationshipDecl) -> Result<Relationship, SchemaError> {
    if decl.remote_side.len() < 2 {
        resolve_direct(decl)
    } else {
        resolve_junction(catalog, decl)
    }
}

fn resolve_direct(decl: &RelationshipDecl) -> Result<Relationship, SchemaError> {
    let local = decl
        .local
        .as_ref()
        .ok_or_else(|| relationship_error(decl, "direct relationship needs a local column".into()))?;
    let remote = decl.remote_side.first().ok_or_else(|| {
        relationship_error(decl, "direct relationship needs a remote column".into())
    })?;

    if local.table != decl.entity {
        return Err(relationship_error(
            decl,
            format!("local column '{local}' is not on '{}'", decl.entity),
        ));
    }
    if remote.table != decl.foreign {
        return Err(relationship_error(
            decl,
            format!("remote column '{remote}' is not on '{}'", decl.foreign),
        ));
    }

    Ok(Relationship::Direct {
        entity_column: local.clone(),
        foreign_column: remote.clone(),
    })
}

fn resolve_junction(catalog: &Catalog, decl: &RelationshipDecl) -> Result<Relationship, SchemaError> {
    if decl.remote_side.len() != 2 {
        return Err(relationship_error(
            decl,
            format!(
                "junction relationship needs exactly 2 remote columns, got {}",
                decl.remote_side.len()
            ),
        ));
    }

    let mapping_table = &decl.remote_side[0].table;
    if decl.remote_side[1].table != *mapping_table {
        return Err(relationship_error(
            decl,
            format!(
                "remote columns '{}' and '{}' are not in the same table",
                decl.remote_side[0], decl.remote_side[1]
            ),
        ));
    }

    // (mapping column, referenced column)
    let mut entity_side: Option<(ColumnKey, ColumnKey)> = None;
    let mut foreign_side: Option<(ColumnKey, ColumnKey)> = None;

    for remote in &decl.remote_side {
        let column = catalog.column(remote).ok_or_else(|| {
            relationship_error(decl, format!("unknown column '{remote}'"))
        })?;
        let [target] = column.references.as_slice() else {
            return Err(relationship_error(
                decl,
                format!(
                    "junction column '{remote}' must have exactly 1 foreign key, has {}",
                    column.references.len()
                ),
            ));
        };

        let slot = if target.table == decl.foreign {
            &mut foreign_side
        } else {
            &mut entity_side
        };
        if slot.is_some() {
            return Err(relationship_error(
                decl,
                format!("junction column '{remote}' duplicates a side"),
            ));
        }
        *slot = Some((remote.clone(), target.clone()));
    }

    let (Some((entity_mapping_column, entity_column)), Some((foreign_mapping_column, foreign_column))) =
        (entity_side, foreign_side)
    else {
        return Err(relationship_error(
            decl,
            "junction columns do not cover both sides".into(),
        ));
    };

    if entity_column.table != decl.entity {
        return Err(relationship_error(
            decl,
            format!(
                "junction column '{entity_mapping_column}' references '{entity_column}', not '{}'",
                decl.entity
            ),
        ));
    }

    Ok(Relationship::Junction {
        mapping_table: mapping_table.clone(),
        entity_column,
        entity_mapping_column,
        foreign_column,
        foreign_mapping_column,
    })
}
