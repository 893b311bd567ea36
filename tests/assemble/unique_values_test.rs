//! Distinct-value query assembly.

use sieve::assemble::{assemble_unique_values, Page, UniqueValuesRequest};
use sieve::error::QueryError;
use sieve::schema::SchemaMap;
use sieve::sql::Dialect;
use sqlparser::dialect::{DuckDbDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

const FIXTURE: &str = include_str!("../fixtures/schema.toml");

fn assemble(request: &UniqueValuesRequest) -> Result<(String, String), QueryError> {
    let schema = SchemaMap::from_toml(FIXTURE).unwrap();
    Ok(assemble_unique_values(&schema, request)?.to_sql(Dialect::Postgres))
}

fn request(column: &str) -> UniqueValuesRequest {
    UniqueValuesRequest {
        column: column.into(),
        page: Page::new(Some(10), None),
        ..Default::default()
    }
}

#[test]
fn test_plain_listing() {
    let (sql, count) = assemble(&request("species")).unwrap();

    assert_eq!(
        sql,
        r#"SELECT
  "subject"."species" AS "species"
FROM "subject"
GROUP BY "subject"."species"
ORDER BY "subject"."species" NULLS LAST
LIMIT 10"#
    );
    assert_eq!(
        count,
        r#"SELECT
  COUNT(*) AS "count"
FROM (SELECT
  "subject"."species" AS "species"
FROM "subject"
GROUP BY "subject"."species"
ORDER BY "subject"."species" NULLS LAST) AS "column_json""#
    );
    for statement in [&sql, &count] {
        Parser::parse_sql(&PostgreSqlDialect {}, statement).unwrap();
    }
}

#[test]
fn test_counts_and_system() {
    let mut req = request("species");
    req.count = true;
    req.system = Some("GDC".into());
    req.page = Page::new(Some(10), Some(30));

    let (sql, _) = assemble(&req).unwrap();
    assert_eq!(
        sql,
        r#"SELECT
  "subject"."species" AS "species",
  COUNT(*) AS "value_count"
FROM "subject"
WHERE "subject"."data_at_gdc" IS TRUE
GROUP BY "subject"."species"
ORDER BY "subject"."species" NULLS LAST
LIMIT 10 OFFSET 30"#
    );
    Parser::parse_sql(&DuckDbDialect {}, &sql).unwrap();
}

#[test]
fn test_system_flag_on_other_table() {
    let mut req = request("format");
    req.system = Some("pdc".into());

    let (sql, _) = assemble(&req).unwrap();
    assert!(sql.contains(r#"WHERE "file"."data_at_pdc" IS TRUE"#));
}

#[test]
fn test_prefixed_column_keeps_uniquename_alias() {
    let (sql, _) = assemble(&request("file_id")).unwrap();
    assert!(sql.starts_with("SELECT\n  \"file\".\"id\" AS \"file_id\"\nFROM \"file\""));
}

#[test]
fn test_unknown_system() {
    let mut req = request("species");
    req.system = Some("XYZ".into());
    let err = assemble(&req).unwrap_err();
    assert_eq!(err.to_string(), "system: XYZ - not found");

    // observation only carries data_at_gdc
    let mut req = request("sex");
    req.system = Some("PDC".into());
    let err = assemble(&req).unwrap_err();
    assert!(matches!(err, QueryError::SystemNotFound { ref system } if system == "PDC"));
}

#[test]
fn test_unknown_column() {
    let err = assemble(&request("FAKE_COLUMN")).unwrap_err();
    assert_eq!(err.to_string(), "Column Not Found: FAKE_COLUMN");
}

#[test]
fn test_unbounded_page() {
    let mut req = request("race");
    req.page = Page::default();
    let (sql, _) = assemble(&req).unwrap();
    assert!(sql.ends_with(r#"ORDER BY "subject"."race" NULLS LAST"#));
}
