//! Summary query: a single row of scalar sub-queries over
//! `filter_preselect`, which here carries every entity column under its
//! uniquename.

use tracing::warn;

use super::preselect::{column_preselect, from_preselect, FILTER_PRESELECT};
use crate::compile::Compiler;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterSet;
use crate::schema::{ColumnDescriptor, Relationship, SchemaMap, ValueKind};
use crate::sql::{
    avg, col, count_distinct, count_star, json_agg, json_object, lit_null, max, min,
    percentile_cont, table_col, Expr, ExprExt, OrderByExpr, Query, SelectExpr, TableRef,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryRequest {
    pub entity: String,
    pub filters: FilterSet,
}

pub fn assemble_summary(schema: &SchemaMap, request: &SummaryRequest) -> QueryResult<Query> {
    let compiler = Compiler::new(schema, &request.entity)?;
    let entity = compiler.entity();
    let preselect = column_preselect(&compiler, &request.filters)?;

    let mut select: Vec<SelectExpr> = vec![Expr::from(
        Query::new()
            .select(vec![count_star()])
            .from(TableRef::new(FILTER_PRESELECT)),
    )
    .alias("total_count")];

    if let Some(target) = &entity.related_count {
        let relationship = schema.relationships.get(&entity.name, target)?;
        select.push(
            Expr::from(related_count(schema, relationship)?).alias(&format!("{target}_count")),
        );
    }

    let mut data_sources: Vec<&ColumnDescriptor> = Vec::new();
    for column in &entity.columns {
        if column.metadata.is_data_source() {
            data_sources.push(column);
            continue;
        }
        if !column.metadata.summary {
            continue;
        }
        let summary = match column.metadata.kind {
            Some(ValueKind::Numeric) => numeric_summary(&column.uniquename),
            Some(ValueKind::Categorical) => categorical_summary(&column.uniquename),
            None => {
                warn!(
                    column = %column.uniquename,
                    data_type = %column.data_type,
                    "Skipping summary column without a value kind"
                );
                continue;
            }
        };
        select.push(Expr::from(summary).alias(&format!("{}_summary", column.uniquename)));
    }

    select.push(data_source_counts(&data_sources).alias("data_source"));

    Ok(Query::new().with_cte(preselect).select(select))
}

/// Distinct foreign rows reachable from the preselected entity rows.
fn related_count(schema: &SchemaMap, relationship: &Relationship) -> QueryResult<Query> {
    let entity_column = relationship.entity_column();
    let preselected = schema
        .registry
        .get(entity_column)
        .map(|c| from_preselect(&c.uniquename))
        .ok_or_else(|| QueryError::ColumnNotFound {
            name: entity_column.to_string(),
            candidates: vec![],
        })?;

    // Junctions are counted on the mapping table alone. Direct links count
    // foreign identities so one-to-many links count every related row.
    let query = match relationship {
        Relationship::Junction {
            mapping_table,
            entity_mapping_column,
            foreign_mapping_column,
            ..
        } => Query::new()
            .select(vec![count_distinct(table_col(
                &foreign_mapping_column.table,
                &foreign_mapping_column.column,
            ))])
            .from(TableRef::new(mapping_table))
            .filter(
                table_col(&entity_mapping_column.table, &entity_mapping_column.column)
                    .in_subquery(preselected),
            ),
        Relationship::Direct { foreign_column, .. } => {
            let foreign = schema.catalog.table(&foreign_column.table)?;
            let counted = foreign
                .identity
                .as_deref()
                .unwrap_or(&foreign_column.column);
            Query::new()
                .select(vec![count_distinct(table_col(&foreign.name, counted))])
                .from(TableRef::new(&foreign.name))
                .filter(
                    table_col(&foreign_column.table, &foreign_column.column)
                        .in_subquery(preselected),
                )
        }
    };

    Ok(query)
}

fn numeric_summary(uniquename: &str) -> Query {
    let value = || col(uniquename);
    Query::new()
        .select(vec![json_object(vec![
            ("min", min(value())),
            ("max", max(value())),
            ("mean", avg(value())),
            ("median", percentile_cont(0.5, value())),
            ("lower_quartile", percentile_cont(0.25, value())),
            ("upper_quartile", percentile_cont(0.75, value())),
        ])])
        .from(TableRef::new(FILTER_PRESELECT))
}

/// `[{"<uniquename>": value, "count": n}, ...]`, NULLs excluded.
fn categorical_summary(uniquename: &str) -> Query {
    let counts = Query::new()
        .select(vec![
            col(uniquename).alias(uniquename),
            count_star().alias("count"),
        ])
        .from(TableRef::new(FILTER_PRESELECT))
        .filter(col(uniquename).is_not_null())
        .group_by(vec![col(uniquename)])
        .order_by(vec![
            OrderByExpr::desc(col("count")),
            OrderByExpr::asc(col(uniquename)),
        ]);

    Query::new()
        .select(vec![json_agg(json_object(vec![
            (uniquename, col(uniquename)),
            ("count", col("count")),
        ]))])
        .from(TableRef::subquery(counts, &format!("{uniquename}_counts")))
}

/// `{"<uniquename>": rows flagged true, ...}` over every data-source column.
fn data_source_counts(columns: &[&ColumnDescriptor]) -> Expr {
    if columns.is_empty() {
        return lit_null();
    }
    let pairs = columns
        .iter()
        .map(|c| {
            (
                c.uniquename.as_str(),
                Expr::Filtered {
                    aggregate: Box::new(count_star()),
                    filter: Box::new(col(&c.uniquename).is_true()),
                },
            )
        })
        .collect();
    Expr::from(
        Query::new()
            .select(vec![json_object(pairs)])
            .from(TableRef::new(FILTER_PRESELECT)),
    )
}
