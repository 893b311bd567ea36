//! Row query assembly.

use sieve::assemble::{assemble_rows, Page, RowsRequest};
use sieve::error::QueryError;
use sieve::filter::FilterSet;
use sieve::schema::SchemaMap;
use sieve::sql::Dialect;
use sqlparser::dialect::{DuckDbDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

const FIXTURE: &str = include_str!("../fixtures/schema.toml");

fn schema() -> SchemaMap {
    SchemaMap::from_toml(FIXTURE).unwrap()
}

fn assert_parses(sql: &str) {
    Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .unwrap_or_else(|e| panic!("invalid Postgres SQL: {e}\n{sql}"));
}

fn request(entity: &str) -> RowsRequest {
    RowsRequest {
        entity: entity.into(),
        page: Page::new(Some(10), None),
        ..Default::default()
    }
}

#[test]
fn test_default_projection() {
    let (sql, count) = assemble_rows(&schema(), &request("observation"))
        .unwrap()
        .to_sql(Dialect::Postgres);

    assert_eq!(
        sql,
        r#"WITH "filter_preselect" AS (
SELECT
  "observation"."id_alias"
FROM "observation"
)
SELECT
  "observation"."sex" AS "sex",
  "observation"."vital_status" AS "vital_status"
FROM "observation"
WHERE "observation"."id_alias" IN (SELECT
  "id_alias"
FROM "filter_preselect")
ORDER BY "observation"."id_alias"
LIMIT 10"#
    );
    assert_eq!(
        count,
        r#"WITH "filter_preselect" AS (
SELECT
  "observation"."id_alias"
FROM "observation"
)
SELECT
  COUNT(*) AS "count"
FROM "filter_preselect""#
    );
    assert_parses(&sql);
    assert_parses(&count);
}

#[test]
fn test_filters_land_in_preselect() {
    let mut req = request("subject");
    req.filters = FilterSet::parse(
        &["species = human"],
        &["year_of_birth > 1950", "race = white"],
    )
    .unwrap();

    let (sql, count) = assemble_rows(&schema(), &req).unwrap().to_sql(Dialect::Postgres);
    let condition = r#"WHERE (COALESCE(UPPER("subject"."species"), '') = UPPER('human') AND ("subject"."year_of_birth" > 1950 OR COALESCE(UPPER("subject"."race"), '') = UPPER('white')))"#;

    assert!(sql.contains(condition), "{sql}");
    assert!(count.contains(condition), "{count}");
    assert_parses(&sql);
}

#[test]
fn test_junction_columns_are_aggregated() {
    let mut req = request("subject");
    req.add_columns = vec!["format".into()];

    let (sql, _) = assemble_rows(&schema(), &req).unwrap().to_sql(Dialect::Postgres);

    assert!(sql.contains(
        r#""file_preselect" AS (
SELECT
  "file_describes_subject"."subject_alias" AS "join_key",
  ARRAY_AGG(DISTINCT "file"."format") FILTER (WHERE "file"."format" IS NOT NULL) AS "format"
FROM "file_describes_subject"
INNER JOIN "file" ON "file"."id_alias" = "file_describes_subject"."file_alias"
WHERE "file_describes_subject"."subject_alias" IN (SELECT
  "id_alias"
FROM "filter_preselect")
GROUP BY "file_describes_subject"."subject_alias"
)"#
    ), "{sql}");
    assert!(sql.contains(r#"  "file_preselect"."format" AS "format""#));
    assert!(sql.contains(
        r#"LEFT JOIN "file_preselect" ON "file_preselect"."join_key" = "subject"."id_alias""#
    ));
    assert_parses(&sql);
}

#[test]
fn test_direct_columns_use_local_key() {
    let mut req = request("observation");
    req.add_columns = vec!["species".into()];

    let (sql, _) = assemble_rows(&schema(), &req).unwrap().to_sql(Dialect::Postgres);

    assert!(sql.contains(
        r#"WHERE "subject"."id_alias" IN (SELECT
  "observation"."subject_alias"
FROM "observation"
WHERE "observation"."id_alias" IN (SELECT
  "id_alias"
FROM "filter_preselect"))
GROUP BY "subject"."id_alias""#
    ), "{sql}");
    assert!(sql.contains(
        r#"LEFT JOIN "subject_preselect" ON "subject_preselect"."join_key" = "observation"."subject_alias""#
    ));
    assert_parses(&sql);
}

#[test]
fn test_projection_is_deduplicated_and_excluded() {
    let mut req = request("observation");
    req.add_columns = vec!["sex".into(), "year_of_observation".into()];
    req.exclude_columns = vec!["vital_status".into()];

    let (sql, _) = assemble_rows(&schema(), &req).unwrap().to_sql(Dialect::Postgres);

    assert_eq!(sql.matches(r#"AS "sex""#).count(), 1);
    assert!(sql.contains(r#""observation"."year_of_observation" AS "year_of_observation""#));
    assert!(!sql.contains("vital_status"));
}

#[test]
fn test_excluding_everything() {
    let mut req = request("observation");
    req.exclude_columns = vec!["sex".into(), "vital_status".into()];

    let err = assemble_rows(&schema(), &req).unwrap_err();
    assert!(matches!(err, QueryError::NoColumnsSelected { ref table } if table == "observation"));
}

#[test]
fn test_unknown_columns() {
    let mut req = request("subject");
    req.add_columns = vec!["FAKE_COLUMN".into()];
    let err = assemble_rows(&schema(), &req).unwrap_err();
    assert_eq!(err.to_string(), "Column Not Found: FAKE_COLUMN");

    let mut req = request("subject");
    req.exclude_columns = vec!["FAKE_COLUMN".into()];
    assert!(assemble_rows(&schema(), &req).is_err());
}

#[test]
fn test_unrelated_added_column() {
    let mut req = request("file");
    req.add_columns = vec!["sex".into()];

    let err = assemble_rows(&schema(), &req).unwrap_err();
    assert!(matches!(err, QueryError::RelationshipNotFound { .. }));
}

#[test]
fn test_non_entity_table() {
    let err = assemble_rows(&schema(), &request("file_describes_subject")).unwrap_err();
    assert_eq!(err.to_string(), "Table Not Found: file_describes_subject");
}

#[test]
fn test_paging() {
    let mut req = request("subject");
    req.page = Page::new(Some(25), Some(50));

    let (sql, count) = assemble_rows(&schema(), &req).unwrap().to_sql(Dialect::Postgres);
    assert!(sql.ends_with("\nLIMIT 25 OFFSET 50"), "{sql}");
    assert!(!count.contains("LIMIT"));
    assert!(!count.contains("OFFSET"));
}

#[test]
fn test_duckdb_output_parses() {
    let mut req = request("subject");
    req.add_columns = vec!["format".into(), "sex".into()];
    req.filters = FilterSet::parse(&["format like bam%"], &["sex = female"]).unwrap();

    let (sql, count) = assemble_rows(&schema(), &req).unwrap().to_sql(Dialect::DuckDb);
    for statement in [&sql, &count] {
        Parser::parse_sql(&DuckDbDialect {}, statement)
            .unwrap_or_else(|e| panic!("invalid DuckDB SQL: {e}\n{statement}"));
    }
}
