//! Catalog loading and validation.

use sieve::error::SchemaError;
use sieve::schema::catalog::Catalog;
use sieve::schema::{ColumnKey, DataType, SchemaMap, ValueKind};

const FIXTURE: &str = include_str!("../fixtures/schema.toml");

fn build(content: &str) -> Result<Catalog, SchemaError> {
    Catalog::from_toml(content)
}

#[test]
fn test_fixture_loads() {
    let catalog = build(FIXTURE).unwrap();

    assert_eq!(catalog.version(), "4.0.0");
    assert_eq!(catalog.tables().len(), 4);

    let entities: Vec<&str> = catalog.entity_tables().map(|t| t.name.as_str()).collect();
    assert_eq!(entities, vec!["subject", "file", "observation"]);
}

#[test]
fn test_fingerprint_is_stable_sha256() {
    let a = build(FIXTURE).unwrap();
    let b = build(FIXTURE).unwrap();

    assert_eq!(a.fingerprint().len(), 64);
    assert!(a.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_fingerprint_changes_with_content() {
    let a = build(FIXTURE).unwrap();
    let b = build(&FIXTURE.replace("4.0.0", "4.0.1")).unwrap();
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_mapping_table_is_not_an_entity() {
    let catalog = build(FIXTURE).unwrap();

    let mapping = catalog.table("file_describes_subject").unwrap();
    assert!(!mapping.is_entity());
    assert!(mapping.identity_column().is_none());

    let err = catalog.entity_table("file_describes_subject").unwrap_err();
    assert_eq!(err.to_string(), "Table Not Found: file_describes_subject");
}

#[test]
fn test_unknown_table() {
    let catalog = build(FIXTURE).unwrap();
    let err = catalog.table("sample").unwrap_err();
    assert_eq!(err.to_string(), "Table Not Found: sample");
}

#[test]
fn test_column_metadata() {
    let catalog = build(FIXTURE).unwrap();
    let subject = catalog.entity_table("subject").unwrap();

    let species = subject.column("species").unwrap();
    assert_eq!(species.data_type, DataType::Text);
    assert_eq!(species.metadata.kind, Some(ValueKind::Categorical));
    assert!(species.metadata.summary);
    assert!(species.metadata.fetch);
    assert!(species.nullable);

    let id = subject.column("id").unwrap();
    assert!(!id.nullable);
    assert_eq!(id.metadata.description.as_deref(), Some("Subject identifier"));

    let gdc = subject.column("data_at_gdc").unwrap();
    assert!(gdc.metadata.is_data_source());
    assert!(!species.metadata.is_data_source());

    assert_eq!(subject.identity_column().unwrap().name, "id_alias");
}

#[test]
fn test_references_are_resolved() {
    let catalog = build(FIXTURE).unwrap();
    let column = catalog
        .column(&ColumnKey::new("observation", "subject_alias"))
        .unwrap();
    assert_eq!(column.references, vec![ColumnKey::new("subject", "id_alias")]);
}

#[test]
fn test_relationship_declarations_attach_to_entity() {
    let catalog = build(FIXTURE).unwrap();

    let subject = catalog.table("subject").unwrap();
    assert_eq!(subject.relationships.len(), 1);
    assert_eq!(subject.relationships[0].foreign, "file");
    assert!(subject.relationships[0].local.is_none());
    assert_eq!(subject.relationships[0].remote_side.len(), 2);

    let observation = catalog.table("observation").unwrap();
    assert_eq!(
        observation.relationships[0].local,
        Some(ColumnKey::new("observation", "subject_alias"))
    );
}

#[test]
fn test_no_tables() {
    let err = build(r#"version = "1""#).unwrap_err();
    assert!(matches!(err, SchemaError::NoTables));
}

#[test]
fn test_parse_error() {
    let err = build("version = ").unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}

#[test]
fn test_empty_table() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "subject"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::EmptyTable { ref table } if table == "subject"));
}

#[test]
fn test_duplicate_table() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "subject"
columns = [{ name = "id", type = "text" }]

[[tables]]
name = "subject"
columns = [{ name = "id", type = "text" }]
"#,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Table 'subject' is declared more than once");
}

#[test]
fn test_duplicate_column() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "subject"
columns = [
    { name = "id", type = "text" },
    { name = "id", type = "integer" },
]
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::DuplicateColumn { ref table, ref column } if table == "subject" && column == "id"
    ));
}

#[test]
fn test_missing_identity() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "subject"
identity = "id_alias"
columns = [{ name = "id", type = "text" }]
"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Identity column 'id_alias' of table 'subject' does not exist"
    );
}

#[test]
fn test_bad_reference() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "observation"
identity = "id"
columns = [
    { name = "id", type = "integer" },
    { name = "subject_alias", type = "integer", references = ["subject.id_alias"] },
]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::BadReference { ref target, .. } if target == "subject.id_alias"));
}

#[test]
fn test_related_count_must_target_entity() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "subject"
identity = "id"
related_count = "mapping"
columns = [{ name = "id", type = "integer" }]

[[tables]]
name = "mapping"
columns = [{ name = "subject_id", type = "integer", references = ["subject.id"] }]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::BadRelatedCount { ref target, .. } if target == "mapping"));
}

#[test]
fn test_relationship_with_unknown_table() {
    let err = build(
        r#"
version = "1"

[[tables]]
name = "subject"
identity = "id"
columns = [{ name = "id", type = "integer" }]

[[relationships]]
entity = "subject"
foreign = "file"
local = "subject.id"
remote_side = ["subject.id"]
"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Relationship error between 'subject' and 'file': unknown table 'file'"
    );
}

#[test]
fn test_schema_map_from_missing_file() {
    let err = SchemaMap::from_file("/nonexistent/schema.toml").unwrap_err();
    assert!(matches!(err, SchemaError::Read(_)));
}
