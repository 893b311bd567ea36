//! The `filter_preselect` CTE.

use crate::compile::Compiler;
use crate::error::{QueryError, QueryResult};
use crate::filter::FilterSet;
use crate::schema::{ColumnDescriptor, TableDescriptor};
use crate::sql::{col, table_col, Cte, ExprExt, Query, SelectExpr, TableRef};

pub const FILTER_PRESELECT: &str = "filter_preselect";

/// Identity column of an entity table.
pub(crate) fn identity(entity: &TableDescriptor) -> QueryResult<&ColumnDescriptor> {
    entity
        .identity_column()
        .ok_or_else(|| QueryError::TableNotFound {
            table: entity.name.clone(),
        })
}

/// `SELECT <identity> FROM <entity> WHERE <filters>`.
pub fn id_preselect(compiler: &Compiler<'_>, filters: &FilterSet) -> QueryResult<Cte> {
    let entity = compiler.entity();
    let id = identity(entity)?;
    preselect(
        compiler,
        filters,
        vec![SelectExpr::new(table_col(&entity.name, &id.name))],
    )
}

/// Every entity column, aliased by uniquename.
pub fn column_preselect(compiler: &Compiler<'_>, filters: &FilterSet) -> QueryResult<Cte> {
    let entity = compiler.entity();
    let columns = entity
        .columns
        .iter()
        .map(|c| table_col(&entity.name, &c.name).alias(&c.uniquename))
        .collect();
    preselect(compiler, filters, columns)
}

fn preselect(
    compiler: &Compiler<'_>,
    filters: &FilterSet,
    columns: Vec<SelectExpr>,
) -> QueryResult<Cte> {
    let mut query = Query::new()
        .select(columns)
        .from(TableRef::new(&compiler.entity().name));
    if let Some(condition) = compiler.compile_filters(filters)? {
        query = query.filter(condition);
    }
    Ok(Cte::new(FILTER_PRESELECT, query))
}

/// `SELECT "<column>" FROM "filter_preselect"`.
pub(crate) fn from_preselect(column: &str) -> Query {
    Query::new()
        .select(vec![col(column)])
        .from(TableRef::new(FILTER_PRESELECT))
}
