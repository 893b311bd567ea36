//! Uniquename assignment and column resolution.

use std::collections::HashSet;

use sieve::error::{QueryError, SchemaError};
use sieve::schema::{ColumnKey, SchemaMap};

const FIXTURE: &str = include_str!("../fixtures/schema.toml");

fn schema() -> SchemaMap {
    SchemaMap::from_toml(FIXTURE).unwrap()
}

fn uniquename(schema: &SchemaMap, table: &str, column: &str) -> String {
    schema
        .registry
        .get(&ColumnKey::new(table, column))
        .unwrap()
        .uniquename
        .clone()
}

#[test]
fn test_shared_names_are_prefixed() {
    let schema = schema();

    assert_eq!(uniquename(&schema, "subject", "id_alias"), "subject_id_alias");
    assert_eq!(uniquename(&schema, "file", "id_alias"), "file_id_alias");
    assert_eq!(uniquename(&schema, "subject", "id"), "subject_id");
    assert_eq!(uniquename(&schema, "file", "id"), "file_id");
    assert_eq!(uniquename(&schema, "subject", "data_at_gdc"), "subject_data_at_gdc");
    assert_eq!(uniquename(&schema, "file", "data_at_pdc"), "file_data_at_pdc");
    assert_eq!(
        uniquename(&schema, "observation", "subject_alias"),
        "observation_subject_alias"
    );
    assert_eq!(
        uniquename(&schema, "file_describes_subject", "subject_alias"),
        "file_describes_subject_subject_alias"
    );
}

#[test]
fn test_distinct_names_are_kept() {
    let schema = schema();

    assert_eq!(uniquename(&schema, "subject", "species"), "species");
    assert_eq!(uniquename(&schema, "file", "format"), "format");
    assert_eq!(uniquename(&schema, "observation", "sex"), "sex");
    assert_eq!(
        uniquename(&schema, "file_describes_subject", "file_alias"),
        "file_alias"
    );
}

#[test]
fn test_every_column_resolves_to_itself() {
    let schema = schema();

    let mut seen = HashSet::new();
    for column in schema.registry.columns() {
        assert!(seen.insert(column.uniquename.clone()), "{}", column.uniquename);
        let resolved = schema.registry.resolve(&column.uniquename).unwrap();
        assert_eq!(resolved.key(), column.key());
    }
    assert_eq!(seen.len(), 22);
    assert_eq!(schema.registry.len(), 22);
}

#[test]
fn test_unknown_column_without_candidates() {
    let err = schema().registry.resolve("FAKE_COLUMN").unwrap_err();
    assert_eq!(err.to_string(), "Column Not Found: FAKE_COLUMN");
}

#[test]
fn test_suffix_candidates() {
    let err = schema().registry.resolve("id_alias").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Column Not Found: id_alias, did you mean: ['subject_id_alias', 'file_id_alias', 'observation_id_alias']"
    );
}

#[test]
fn test_candidate_message() {
    let err = schema().registry.resolve("alias").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Column Not Found: alias, did you mean: ['subject_id_alias', 'file_id_alias', \
         'observation_id_alias', 'observation_subject_alias', 'file_alias', \
         'file_describes_subject_subject_alias']"
    );
}

#[test]
fn test_prefix_candidates() {
    let err = schema().registry.resolve("subject").unwrap_err();
    match err {
        QueryError::ColumnNotFound { name, candidates } => {
            assert_eq!(name, "subject");
            assert_eq!(
                candidates,
                vec![
                    "subject_id_alias",
                    "subject_id",
                    "subject_data_at_gdc",
                    "subject_data_at_pdc"
                ]
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_candidates_keep_duplicates() {
    let schema = SchemaMap::from_toml(
        r#"
version = "1"

[[tables]]
name = "t"
identity = "id"
columns = [{ name = "id", type = "integer" }, { name = "a_a", type = "text" }]
"#,
    )
    .unwrap();

    let err = schema.registry.resolve("a").unwrap_err();
    assert_eq!(err.to_string(), "Column Not Found: a, did you mean: ['a_a', 'a_a']");
}

#[test]
fn test_columns_of_table() {
    let schema = schema();

    let names: Vec<&str> = schema
        .registry
        .columns_of("observation")
        .unwrap()
        .iter()
        .map(|c| c.uniquename.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "observation_id_alias",
            "observation_subject_alias",
            "sex",
            "vital_status",
            "year_of_observation",
            "observation_data_at_gdc"
        ]
    );

    let err = schema.registry.columns_of("sample").unwrap_err();
    assert!(matches!(err, QueryError::TableNotFound { .. }));
}

#[test]
fn test_prefixed_name_collision_is_rejected() {
    let err = SchemaMap::from_toml(
        r#"
version = "1"

[[tables]]
name = "a"
identity = "b_c"
columns = [{ name = "b_c", type = "integer" }, { name = "x", type = "integer" }]

[[tables]]
name = "a_b"
identity = "c"
columns = [{ name = "c", type = "integer" }, { name = "x", type = "integer" }]

[[tables]]
name = "other"
identity = "c"
columns = [{ name = "c", type = "integer" }, { name = "b_c", type = "integer" }]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::UniquenameCollision { ref name } if name == "a_b_c"));
}
