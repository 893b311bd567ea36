//! Filter string parser.
//!
//! The operator is located with a single regex scan. Word operators must be
//! surrounded by whitespace; symbolic operators are tried longest first so
//! that `<=` is never read as `<` followed by `=`. Exactly one operator
//! match is allowed per filter.

use std::sync::LazyLock;

use regex::Regex;

use super::{Operator, Predicate, Scalar, Value};
use crate::error::{QueryError, QueryResult};

static OPERATOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\s+(?:is\s+not|is_not|not\s+in|not_in|not\s+like|not_like|not\s+between|not_between|is|in|like|between)\s+)|(!=|<>|<=|>=|=|<|>)",
    )
    .expect("operator pattern is valid")
});

static INT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(0|[1-9][0-9]*)$").expect("integer pattern is valid"));

static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)$")
        .expect("float pattern is valid")
});

/// Parse `<column> <operator> <value>` into a [`Predicate`].
pub fn parse_filter(filter: &str) -> QueryResult<Predicate> {
    let matches: Vec<_> = OPERATOR_PATTERN.find_iter(filter).collect();
    let found = match matches.as_slice() {
        [] => return Err(QueryError::parsing(filter, "no valid operator found")),
        [found] => *found,
        _ => return Err(QueryError::parsing(filter, "more than one operator found")),
    };

    let operator = Operator::parse(found.as_str())
        .ok_or_else(|| QueryError::parsing(filter, "unrecognized operator"))?;

    let column = filter[..found.start()].trim();
    if column.is_empty() || column.contains(char::is_whitespace) {
        return Err(QueryError::parsing(filter, "missing column"));
    }

    let raw_value = filter[found.end()..].trim();
    if raw_value.is_empty() {
        return Err(QueryError::parsing(filter, "missing value"));
    }
    let value = parse_value(raw_value);

    match (&value, operator.takes_list()) {
        (Value::Scalar(_), true) => {
            return Err(QueryError::parsing(
                filter,
                format!("operator '{operator}' requires a list value"),
            ));
        }
        (Value::List(_), false) => {
            return Err(QueryError::parsing(
                filter,
                format!("list value not allowed with operator '{operator}'"),
            ));
        }
        _ => {}
    }

    Ok(Predicate {
        column: column.to_string(),
        operator,
        value,
    })
}

/// Evaluate a literal, falling back to the raw text.
fn parse_value(raw: &str) -> Value {
    if let Some(items) = parse_list(raw) {
        return Value::List(items);
    }
    Value::Scalar(parse_literal(raw))
}

/// A single literal, falling back to the raw text.
pub(crate) fn parse_literal(raw: &str) -> Scalar {
    parse_scalar(raw).unwrap_or_else(|| Scalar::Text(raw.to_string()))
}

/// Strict literal: number, boolean, null or quoted string.
fn parse_scalar(raw: &str) -> Option<Scalar> {
    if INT_PATTERN.is_match(raw) {
        // Out of i64 range stays text.
        if let Ok(n) = raw.parse::<i64>() {
            return Some(Scalar::Int(n));
        }
    }
    if FLOAT_PATTERN.is_match(raw) {
        return raw.parse::<f64>().ok().map(Scalar::Float);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Some(Scalar::Bool(true)),
        "false" => return Some(Scalar::Bool(false)),
        "null" | "none" => return Some(Scalar::Null),
        _ => {}
    }
    unquote(raw).map(Scalar::Text)
}

fn unquote(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    let quote = chars.next().filter(|c| *c == '\'' || *c == '"')?;
    let mut out = String::new();
    let mut escaped = false;
    let mut closed = false;
    for c in chars {
        if closed {
            return None;
        }
        match c {
            _ if escaped => {
                out.push(c);
                escaped = false;
            }
            '\\' => escaped = true,
            c if c == quote => closed = true,
            c => out.push(c),
        }
    }
    closed.then_some(out)
}

/// `[a, b, ...]` where every item is a strict literal.
fn parse_list(raw: &str) -> Option<Vec<Scalar>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    split_items(inner)?
        .into_iter()
        .map(|item| parse_scalar(item.trim()))
        .collect()
}

/// Split on top-level commas, honouring quotes. A trailing comma is allowed.
fn split_items(inner: &str) -> Option<Vec<&str>> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in inner.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                ',' => {
                    items.push(&inner[start..i]);
                    start = i + 1;
                }
                '[' | ']' => return None,
                _ => {}
            },
        }
    }
    if quote.is_some() {
        return None;
    }

    let last = &inner[start..];
    if !last.trim().is_empty() {
        items.push(last);
    } else if items.is_empty() {
        return None;
    }
    Some(items)
}
