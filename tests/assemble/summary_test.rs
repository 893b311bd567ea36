//! Summary query assembly.

use sieve::assemble::{assemble_summary, SummaryRequest};
use sieve::error::QueryError;
use sieve::filter::FilterSet;
use sieve::schema::SchemaMap;
use sieve::sql::Dialect;
use sqlparser::dialect::{DuckDbDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

const FIXTURE: &str = include_str!("../fixtures/schema.toml");

fn summary_sql(entity: &str, filters: FilterSet, dialect: Dialect) -> Result<String, QueryError> {
    let schema = SchemaMap::from_toml(FIXTURE).unwrap();
    let request = SummaryRequest {
        entity: entity.into(),
        filters,
    };
    Ok(assemble_summary(&schema, &request)?.to_sql(dialect))
}

fn assert_parses(sql: &str) {
    Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .unwrap_or_else(|e| panic!("invalid Postgres SQL: {e}\n{sql}"));
}

#[test]
fn test_preselect_carries_every_column() {
    let sql = summary_sql("subject", FilterSet::default(), Dialect::Postgres).unwrap();

    assert!(sql.starts_with(
        r#"WITH "filter_preselect" AS (
SELECT
  "subject"."id_alias" AS "subject_id_alias",
  "subject"."id" AS "subject_id",
  "subject"."species" AS "species","#
    ), "{sql}");
    assert!(sql.contains(r#"  "subject"."data_at_pdc" AS "subject_data_at_pdc"
FROM "subject"
)"#));
    assert_parses(&sql);
}

#[test]
fn test_total_and_related_count() {
    let sql = summary_sql("subject", FilterSet::default(), Dialect::Postgres).unwrap();

    assert!(sql.contains(
        r#"(SELECT
  COUNT(*)
FROM "filter_preselect") AS "total_count""#
    ));
    assert!(sql.contains(
        r#"(SELECT
  COUNT(DISTINCT "file_describes_subject"."file_alias")
FROM "file_describes_subject"
WHERE "file_describes_subject"."subject_alias" IN (SELECT
  "subject_id_alias"
FROM "filter_preselect")) AS "file_count""#
    ), "{sql}");
}

#[test]
fn test_direct_related_count() {
    let sql = summary_sql("observation", FilterSet::default(), Dialect::Postgres).unwrap();

    assert!(sql.contains(
        r#"(SELECT
  COUNT(DISTINCT "subject"."id_alias")
FROM "subject"
WHERE "subject"."id_alias" IN (SELECT
  "observation_subject_alias"
FROM "filter_preselect")) AS "subject_count""#
    ), "{sql}");
    assert_parses(&sql);
}

#[test]
fn test_column_summaries() {
    let sql = summary_sql("subject", FilterSet::default(), Dialect::Postgres).unwrap();

    for alias in [
        "species_summary",
        "year_of_birth_summary",
        "year_of_death_summary",
        "race_summary",
    ] {
        assert!(sql.contains(&format!(r#") AS "{alias}""#)), "{alias}");
    }
    assert!(!sql.contains("subject_id_summary"));
    assert!(!sql.contains("data_at_gdc_summary"));

    assert!(sql.contains(
        r#"JSON_AGG(JSON_BUILD_OBJECT('species', "species", 'count', "count"))"#
    ));
    assert!(sql.contains(r#"WHERE "race" IS NOT NULL
GROUP BY "race"
ORDER BY "count" DESC, "race" ASC) AS "race_counts""#));
    assert!(sql.contains(r#"'median', PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY "year_of_birth")"#));
}

#[test]
fn test_data_source_counts() {
    let sql = summary_sql("subject", FilterSet::default(), Dialect::Postgres).unwrap();

    assert!(sql.contains(
        r#"JSON_BUILD_OBJECT('subject_data_at_gdc', COUNT(*) FILTER (WHERE "subject_data_at_gdc" IS TRUE), 'subject_data_at_pdc', COUNT(*) FILTER (WHERE "subject_data_at_pdc" IS TRUE))"#
    ), "{sql}");
    assert!(sql.ends_with(r#"FROM "filter_preselect") AS "data_source""#));
}

#[test]
fn test_without_data_sources() {
    let schema = SchemaMap::from_toml(
        r#"
version = "1"

[[tables]]
name = "sample"
identity = "id"

[[tables.columns]]
name = "id"
type = "integer"

[[tables.columns]]
name = "tissue"
type = "text"
meta = { kind = "categorical", summary = true }

[[tables.columns]]
name = "notes"
type = "text"
meta = { summary = true }
"#,
    )
    .unwrap();
    let request = SummaryRequest {
        entity: "sample".into(),
        filters: FilterSet::default(),
    };
    let sql = assemble_summary(&schema, &request)
        .unwrap()
        .to_sql(Dialect::Postgres);

    assert!(sql.ends_with(r#"NULL AS "data_source""#), "{sql}");
    assert!(sql.contains(r#"AS "tissue_summary""#));
    assert!(!sql.contains("notes_summary"));
    assert!(!sql.contains("_count\""));
    assert_parses(&sql);
}

#[test]
fn test_foreign_filter() {
    let filters = FilterSet::parse(&["species = human", "format = bam"], &[] as &[&str]).unwrap();
    let sql = summary_sql("file", filters, Dialect::Postgres).unwrap();

    assert!(sql.contains(
        r#"WHERE (EXISTS (SELECT
  1
FROM "file_describes_subject"
INNER JOIN "subject" ON "subject"."id_alias" = "file_describes_subject"."subject_alias"
WHERE "file_describes_subject"."file_alias" = "file"."id_alias" AND COALESCE(UPPER("subject"."species"), '') = UPPER('human')) AND COALESCE(UPPER("file"."format"), '') = UPPER('bam'))
)"#
    ), "{sql}");
    assert_parses(&sql);
}

#[test]
fn test_unrelated_filter_fails() {
    let filters = FilterSet::parse(&["sex = female"], &[] as &[&str]).unwrap();
    let err = summary_sql("file", filters, Dialect::Postgres).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to find relationship between file and observation"
    );
}

#[test]
fn test_duckdb_functions() {
    let sql = summary_sql("file", FilterSet::default(), Dialect::DuckDb).unwrap();

    assert!(sql.contains("JSON_GROUP_ARRAY(JSON_OBJECT('format', \"format\", 'count', \"count\"))"));
    assert!(!sql.contains("JSON_BUILD_OBJECT"));
    Parser::parse_sql(&DuckDbDialect {}, &sql)
        .unwrap_or_else(|e| panic!("invalid DuckDB SQL: {e}\n{sql}"));
}

#[test]
fn test_one_to_many_related_count() {
    let toml = FIXTURE.replacen(
        r#"related_count = "file""#,
        r#"related_count = "observation""#,
        1,
    );
    let schema = SchemaMap::from_toml(&toml).unwrap();
    let request = SummaryRequest {
        entity: "subject".into(),
        filters: FilterSet::default(),
    };
    let sql = assemble_summary(&schema, &request)
        .unwrap()
        .to_sql(Dialect::Postgres);

    assert!(sql.contains(
        r#"(SELECT
  COUNT(DISTINCT "observation"."id_alias")
FROM "observation"
WHERE "observation"."subject_alias" IN (SELECT
  "subject_id_alias"
FROM "filter_preselect")) AS "observation_count""#
    ), "{sql}");
    assert!(!sql.contains(r#"COUNT(DISTINCT "observation"."subject_alias")"#));
    assert_parses(&sql);
}
