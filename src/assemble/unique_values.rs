//! Distinct values of a single column.

use super::{Page, PagedQuery};
use crate::error::{QueryError, QueryResult};
use crate::schema::{ColumnDescriptor, SchemaMap};
use crate::sql::{count_star, table_col, ExprExt, OrderByExpr, Query, SelectExpr, TableRef};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniqueValuesRequest {
    /// Uniquename of the column.
    pub column: String,
    /// Only rows present in this source system (`<table>_data_at_<system>`).
    pub system: Option<String>,
    /// Add a `value_count` column.
    pub count: bool,
    /// Report the total in the response. It is computed either way.
    pub total_count: bool,
    pub page: Page,
}

pub fn assemble_unique_values(
    schema: &SchemaMap,
    request: &UniqueValuesRequest,
) -> QueryResult<PagedQuery> {
    let column = schema.registry.resolve(&request.column)?;
    let value = table_col(&column.table, &column.name);

    let mut select: Vec<SelectExpr> = vec![value.clone().alias(&column.uniquename)];
    if request.count {
        select.push(count_star().alias("value_count"));
    }

    let mut query = Query::new()
        .select(select)
        .from(TableRef::new(&column.table));
    if let Some(system) = &request.system {
        let flag = system_column(schema, column, system)?;
        query = query.filter(table_col(&flag.table, &flag.name).is_true());
    }
    let query = query
        .group_by(vec![value.clone()])
        .order_by(vec![OrderByExpr::new(value).nulls_last()]);

    let count = Query::new()
        .select(vec![count_star().alias("count")])
        .from(TableRef::subquery(query.clone(), "column_json"));

    Ok(PagedQuery {
        query: request.page.apply(query),
        count,
    })
}

/// The `<table>_data_at_<system>` flag column on the same table as `column`.
fn system_column<'a>(
    schema: &'a SchemaMap,
    column: &ColumnDescriptor,
    system: &str,
) -> QueryResult<&'a ColumnDescriptor> {
    let name = format!("{}_data_at_{}", column.table, system.to_lowercase());
    schema
        .registry
        .resolve(&name)
        .ok()
        .filter(|flag| flag.table == column.table)
        .ok_or_else(|| QueryError::SystemNotFound {
            system: system.to_string(),
        })
}
