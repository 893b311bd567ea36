//! Row-fetch query.
//!
//! ```sql
//! WITH "filter_preselect" AS (SELECT "subject"."id_alias" FROM "subject" WHERE ...),
//! "file_preselect" AS (
//!   SELECT <join key> AS "join_key", ARRAY_AGG(DISTINCT ...) FILTER (...) AS "format"
//!   ... GROUP BY <join key>
//! )
//! SELECT "subject"."species" AS "species", "file_preselect"."format" AS "format"
//! FROM "subject"
//! LEFT JOIN "file_preselect" ON "file_preselect"."join_key" = "subject"."id_alias"
//! WHERE "subject"."id_alias" IN (SELECT "id_alias" FROM "filter_preselect")
//! ORDER BY "subject"."id_alias"
//! LIMIT 100
//! ```

use tracing::debug;

use super::preselect::{from_preselect, id_preselect, identity, FILTER_PRESELECT};
use super::{Page, PagedQuery};
use crate::compile::Compiler;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterSet;
use crate::schema::{ColumnDescriptor, Relationship, SchemaMap, TableDescriptor};
use crate::sql::{
    array_agg_distinct_non_null, count_star, table_col, Cte, Expr, ExprExt, OrderByExpr, Query,
    SelectExpr, TableRef,
};

const JOIN_KEY: &str = "join_key";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowsRequest {
    pub entity: String,
    pub filters: FilterSet,
    /// Uniquenames added to the entity's default columns.
    pub add_columns: Vec<String>,
    /// Uniquenames removed from the projection.
    pub exclude_columns: Vec<String>,
    pub page: Page,
}

/// Assemble the row query and its count query.
pub fn assemble_rows(schema: &SchemaMap, request: &RowsRequest) -> QueryResult<PagedQuery> {
    let compiler = Compiler::new(schema, &request.entity)?;
    let entity = compiler.entity();
    let id = identity(entity)?;

    let preselect = id_preselect(&compiler, &request.filters)?;
    let projection = projection(schema, entity, request)?;

    let mut ctes = vec![preselect.clone()];
    let mut select: Vec<SelectExpr> = Vec::with_capacity(projection.len());
    let mut joins: Vec<(TableRef, Expr)> = Vec::new();

    for group in group_by_table(&projection) {
        if group.table == entity.name {
            select.extend(
                group
                    .columns
                    .iter()
                    .map(|c| table_col(&entity.name, &c.name).alias(&c.uniquename)),
            );
            continue;
        }

        let relationship = schema.relationships.get(&entity.name, &group.table)?;
        let name = format!("{}_preselect", group.table);
        ctes.push(Cte::new(
            &name,
            foreign_preselect(entity, &id.name, relationship, &group.columns),
        ));
        select.extend(
            group
                .columns
                .iter()
                .map(|c| table_col(&name, &c.uniquename).alias(&c.uniquename)),
        );
        let entity_column = relationship.entity_column();
        joins.push((
            TableRef::new(&name),
            table_col(&name, JOIN_KEY).eq(table_col(&entity_column.table, &entity_column.column)),
        ));
    }

    debug!(
        entity = %entity.name,
        columns = select.len(),
        foreign_tables = joins.len(),
        "Assembled row projection"
    );

    let mut query = Query::new()
        .with_ctes(ctes)
        .select(select)
        .from(TableRef::new(&entity.name));
    for (table, on) in joins {
        query = query.left_join(table, on);
    }
    let query = query
        .filter(table_col(&entity.name, &id.name).in_subquery(from_preselect(&id.name)))
        .order_by(vec![OrderByExpr::new(table_col(&entity.name, &id.name))]);

    let count = Query::new()
        .with_cte(preselect)
        .select(vec![count_star().alias("count")])
        .from(TableRef::new(FILTER_PRESELECT));

    Ok(PagedQuery {
        query: request.page.apply(query),
        count,
    })
}

/// Default columns of the entity, plus additions, minus exclusions.
fn projection<'a>(
    schema: &'a SchemaMap,
    entity: &'a TableDescriptor,
    request: &RowsRequest,
) -> QueryResult<Vec<&'a ColumnDescriptor>> {
    let mut columns: Vec<&ColumnDescriptor> =
        entity.columns.iter().filter(|c| c.metadata.fetch).collect();

    for name in &request.add_columns {
        let column = schema.registry.resolve(name)?;
        if !columns.iter().any(|c| c.uniquename == column.uniquename) {
            columns.push(column);
        }
    }
    for name in &request.exclude_columns {
        let column = schema.registry.resolve(name)?;
        columns.retain(|c| c.uniquename != column.uniquename);
    }

    if columns.is_empty() {
        return Err(QueryError::NoColumnsSelected {
            table: entity.name.clone(),
        });
    }
    Ok(columns)
}

struct TableGroup<'a> {
    table: String,
    columns: Vec<&'a ColumnDescriptor>,
}

/// Group columns by owning table, in order of first appearance.
fn group_by_table<'a>(columns: &[&'a ColumnDescriptor]) -> Vec<TableGroup<'a>> {
    let mut groups: Vec<TableGroup<'a>> = Vec::new();
    for &column in columns {
        match groups.iter_mut().find(|g| g.table == column.table) {
            Some(group) => group.columns.push(column),
            None => groups.push(TableGroup {
                table: column.table.clone(),
                columns: vec![column],
            }),
        }
    }
    groups
}

/// One row per entity join key holding the requested foreign columns as
/// deduplicated, null-free arrays.
fn foreign_preselect(
    entity: &TableDescriptor,
    identity: &str,
    relationship: &Relationship,
    columns: &[&ColumnDescriptor],
) -> Query {
    let entity_column = relationship.entity_column();
    let foreign_column = relationship.foreign_column();

    // The join key lives on the mapping table for junctions and on the
    // foreign table for direct relationships.
    let join_key = match relationship.entity_mapping_column() {
        Some(mapping) => table_col(&mapping.table, &mapping.column),
        None => table_col(&foreign_column.table, &foreign_column.column),
    };

    let entity_keys = if entity_column.column == identity {
        from_preselect(identity)
    } else {
        Query::new()
            .select(vec![table_col(&entity.name, &entity_column.column)])
            .from(TableRef::new(&entity.name))
            .filter(table_col(&entity.name, identity).in_subquery(from_preselect(identity)))
    };

    let mut select = vec![join_key.clone().alias(JOIN_KEY)];
    select.extend(columns.iter().map(|c| {
        array_agg_distinct_non_null(table_col(&c.table, &c.name)).alias(&c.uniquename)
    }));

    let query = match relationship {
        Relationship::Direct { .. } => Query::new()
            .select(select)
            .from(TableRef::new(&foreign_column.table)),
        Relationship::Junction {
            mapping_table,
            foreign_mapping_column,
            ..
        } => Query::new()
            .select(select)
            .from(TableRef::new(mapping_table))
            .inner_join(
                TableRef::new(&foreign_column.table),
                table_col(&foreign_column.table, &foreign_column.column).eq(table_col(
                    &foreign_mapping_column.table,
                    &foreign_mapping_column.column,
                )),
            ),
    };

    query
        .filter(join_key.clone().in_subquery(entity_keys))
        .group_by(vec![join_key])
}
