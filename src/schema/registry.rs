//! Column registry: the global name space requests address columns by.
//!
//! A column keeps its raw name as its `uniquename` unless another table
//! declares a column with the same raw name, in which case every one of
//! them becomes `{table}_{name}`.

use std::collections::HashMap;

use super::catalog::{Catalog, ColumnDescriptor};
use super::types::ColumnKey;
use crate::error::{QueryError, QueryResult, SchemaError};

/// Assign a uniquename to every `(table, column)` pair.
///
/// Fails when two pairs end up with the same name, e.g. `a.b_c` and `a_b.c`
/// both colliding into `a_b_c`.
pub(crate) fn assign_uniquenames<'a>(
    pairs: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<HashMap<ColumnKey, String>, SchemaError> {
    let pairs: Vec<(&str, &str)> = pairs.collect();

    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for (_, column) in &pairs {
        *frequency.entry(column).or_default() += 1;
    }

    let mut assigned = HashMap::with_capacity(pairs.len());
    let mut taken: HashMap<String, ColumnKey> = HashMap::with_capacity(pairs.len());
    for (table, column) in pairs {
        let name = if frequency[column] > 1 {
            format!("{table}_{column}")
        } else {
            column.to_string()
        };
        let key = ColumnKey::new(table, column);
        if taken.insert(name.clone(), key.clone()).is_some() {
            return Err(SchemaError::UniquenameCollision { name });
        }
        assigned.insert(key, name);
    }
    Ok(assigned)
}

/// Lookup structure over every column of the catalog, in declaration order.
#[derive(Debug, Clone)]
pub struct Registry {
    columns: Vec<ColumnDescriptor>,
    by_name: HashMap<String, usize>,
    by_table: HashMap<String, Vec<usize>>,
}

impl Registry {
    pub fn build(catalog: &Catalog) -> Self {
        let columns: Vec<ColumnDescriptor> = catalog
            .tables()
            .iter()
            .flat_map(|t| t.columns.iter().cloned())
            .collect();

        let mut by_name = HashMap::with_capacity(columns.len());
        let mut by_table: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            by_name.insert(column.uniquename.clone(), i);
            by_table.entry(column.table.clone()).or_default().push(i);
        }

        Self {
            columns,
            by_name,
            by_table,
        }
    }

    /// Every registered column.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Resolve a uniquename.
    ///
    /// On a miss the error carries suggestions: names ending with `name`,
    /// then names starting with it, each group in registry order.
    pub fn resolve(&self, name: &str) -> QueryResult<&ColumnDescriptor> {
        match self.by_name.get(name) {
            Some(&i) => Ok(&self.columns[i]),
            None => Err(QueryError::ColumnNotFound {
                name: name.to_string(),
                candidates: self.suggestions(name),
            }),
        }
    }

    /// Resolve by `(table, raw column name)`.
    pub fn get(&self, key: &ColumnKey) -> Option<&ColumnDescriptor> {
        self.by_table
            .get(&key.table)?
            .iter()
            .map(|&i| &self.columns[i])
            .find(|c| c.name == key.column)
    }

    /// Columns of `table`, in declaration order.
    pub fn columns_of(&self, table: &str) -> QueryResult<Vec<&ColumnDescriptor>> {
        self.by_table
            .get(table)
            .map(|indices| indices.iter().map(|&i| &self.columns[i]).collect())
            .ok_or_else(|| QueryError::TableNotFound {
                table: table.to_string(),
            })
    }

    fn suggestions(&self, name: &str) -> Vec<String> {
        let suffix = self
            .columns
            .iter()
            .filter(|c| c.uniquename.ends_with(name))
            .map(|c| c.uniquename.clone());
        let prefix = self
            .columns
            .iter()
            .filter(|c| c.uniquename.starts_with(name))
            .map(|c| c.uniquename.clone());
        suffix.chain(prefix).collect()
    }
}
