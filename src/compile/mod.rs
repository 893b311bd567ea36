//! Predicate compilation.
//!
//! Turns parsed [`Predicate`]s into SQL conditions evaluated against an
//! entity table. A predicate on another table's column becomes an
//! `EXISTS` over the relationship path, so related rows constrain the
//! entity set without multiplying entity rows.

mod predicate;

pub use predicate::compile_condition;

use tracing::trace;

use crate::error::QueryResult;
use crate::filter::{FilterSet, Predicate};
use crate::schema::{Relationship, SchemaMap, TableDescriptor};
use crate::sql::{and_all, exists, lit_int, or_any, table_col, Expr, ExprExt, Query, TableRef};

/// Compiles predicates for one entity table.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    schema: &'a SchemaMap,
    entity: &'a TableDescriptor,
}

impl<'a> Compiler<'a> {
    /// Fails with `TableNotFound` unless `entity` is an entity table.
    pub fn new(schema: &'a SchemaMap, entity: &str) -> QueryResult<Self> {
        let entity = schema.catalog.entity_table(entity)?;
        Ok(Self { schema, entity })
    }

    pub fn entity(&self) -> &'a TableDescriptor {
        self.entity
    }

    /// Compile one predicate.
    pub fn compile_predicate(&self, predicate: &Predicate) -> QueryResult<Expr> {
        let column = self.schema.registry.resolve(&predicate.column)?;
        let condition = compile_condition(column, predicate.operator, &predicate.value)?;

        if column.table == self.entity.name {
            return Ok(condition);
        }

        let relationship = self
            .schema
            .relationships
            .get(&self.entity.name, &column.table)?;
        trace!(
            column = %column.uniquename,
            foreign = %column.table,
            "Wrapping foreign predicate in EXISTS"
        );
        Ok(exists(related_rows(relationship).filter(condition)))
    }

    /// `(all AND ...) AND (some OR ...)`; `None` when the set is empty.
    pub fn compile_filters(&self, filters: &FilterSet) -> QueryResult<Option<Expr>> {
        let all = filters
            .match_all
            .iter()
            .map(|p| self.compile_predicate(p))
            .collect::<QueryResult<Vec<_>>>()?;
        let some = filters
            .match_some
            .iter()
            .map(|p| self.compile_predicate(p))
            .collect::<QueryResult<Vec<_>>>()?;

        let groups: Vec<Expr> = [and_all(all), or_any(some)].into_iter().flatten().collect();
        Ok(and_all(groups))
    }
}

/// `SELECT 1 FROM <foreign side> WHERE <joined to the outer entity row>`.
fn related_rows(relationship: &Relationship) -> Query {
    match relationship {
        Relationship::Direct {
            entity_column,
            foreign_column,
        } => Query::new()
            .select(vec![lit_int(1)])
            .from(TableRef::new(&foreign_column.table))
            .filter(
                table_col(&foreign_column.table, &foreign_column.column)
                    .eq(table_col(&entity_column.table, &entity_column.column)),
            ),
        Relationship::Junction {
            mapping_table,
            entity_column,
            entity_mapping_column,
            foreign_column,
            foreign_mapping_column,
        } => Query::new()
            .select(vec![lit_int(1)])
            .from(TableRef::new(mapping_table))
            .inner_join(
                TableRef::new(&foreign_column.table),
                table_col(&foreign_column.table, &foreign_column.column).eq(table_col(
                    &foreign_mapping_column.table,
                    &foreign_mapping_column.column,
                )),
            )
            .filter(
                table_col(&entity_mapping_column.table, &entity_mapping_column.column)
                    .eq(table_col(&entity_column.table, &entity_column.column)),
            ),
    }
}
