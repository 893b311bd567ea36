//! Filter strings as clients send them.

use sieve::error::QueryError;
use sieve::filter::{parse_filter, FilterSet, Operator, Scalar, Value};

fn text(s: &str) -> Value {
    Value::Scalar(Scalar::Text(s.into()))
}

#[test]
fn test_every_operator_spelling() {
    let cases = [
        ("sex = female", Operator::Eq),
        ("sex != female", Operator::Ne),
        ("sex <> female", Operator::Ne),
        ("year_of_birth < 1950", Operator::Lt),
        ("year_of_birth <= 1950", Operator::Lte),
        ("year_of_birth > 1950", Operator::Gt),
        ("year_of_birth >= 1950", Operator::Gte),
        ("race is null", Operator::Is),
        ("race is not null", Operator::IsNot),
        ("race is_not null", Operator::IsNot),
        ("race in ['white']", Operator::In),
        ("race not in ['white']", Operator::NotIn),
        ("race like wh%", Operator::Like),
        ("race not like wh%", Operator::NotLike),
        ("year_of_birth between 1 and 2", Operator::Between),
        ("year_of_birth not between 1 and 2", Operator::NotBetween),
        ("year_of_birth NOT_BETWEEN 1 and 2", Operator::NotBetween),
    ];

    for (filter, expected) in cases {
        let predicate = parse_filter(filter).unwrap_or_else(|e| panic!("{filter}: {e}"));
        assert_eq!(predicate.operator, expected, "{filter}");
    }
}

#[test]
fn test_bare_words_stay_text() {
    let p = parse_filter("vital_status = not reported").unwrap();
    assert_eq!(p.column, "vital_status");
    assert_eq!(p.value, text("not reported"));

    let p = parse_filter("species = Homo sapiens").unwrap();
    assert_eq!(p.value, text("Homo sapiens"));
}

#[test]
fn test_quoted_value_is_unquoted() {
    let p = parse_filter("race = 'black or african american'").unwrap();
    assert_eq!(p.value, text("black or african american"));
}

#[test]
fn test_numeric_values() {
    let p = parse_filter("size > 1e6").unwrap();
    assert_eq!(p.value, Value::Scalar(Scalar::Float(1e6)));

    let p = parse_filter("year_of_birth = -12").unwrap();
    assert_eq!(p.value, Value::Scalar(Scalar::Int(-12)));

    let p = parse_filter("size = 99999999999999999999").unwrap();
    assert_eq!(p.value, text("99999999999999999999"));
}

#[test]
fn test_mixed_list() {
    let p = parse_filter("race in ['white', \"asian\", null]").unwrap();
    assert_eq!(
        p.value,
        Value::List(vec![
            Scalar::Text("white".into()),
            Scalar::Text("asian".into()),
            Scalar::Null
        ])
    );
}

#[test]
fn test_list_of_bare_words_is_rejected_for_in() {
    let err = parse_filter("race in [white, asian]").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parsing Error: operator 'in' requires a list value in filter 'race in [white, asian]'"
    );
}

#[test]
fn test_missing_value() {
    let err = parse_filter("sex = ").unwrap_err();
    assert!(matches!(err, QueryError::Parsing { ref reason, .. } if reason == "missing value"));
}

#[test]
fn test_error_echoes_filter() {
    let err = parse_filter("sex ~ male").unwrap_err();
    match err {
        QueryError::Parsing { filter, reason } => {
            assert_eq!(filter, "sex ~ male");
            assert_eq!(reason, "no valid operator found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_filter_set_groups() {
    let set = FilterSet::parse(
        &["sex = female", "year_of_birth >= 1950"],
        &["race = white"],
    )
    .unwrap();

    assert_eq!(set.match_all.len(), 2);
    assert_eq!(set.match_some.len(), 1);
    assert_eq!(set.match_some[0].column, "race");
    assert!(!set.is_empty());
}

#[test]
fn test_filter_set_empty() {
    let none: [&str; 0] = [];
    let set = FilterSet::parse(&none, &none).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.to_string(), "match_all=[] match_some=[]");
}

#[test]
fn test_filter_set_fails_on_first_bad_filter() {
    let err = FilterSet::parse(&["sex = female"], &["race white"]).unwrap_err();
    assert!(err.to_string().ends_with("in filter 'race white'"));
}
