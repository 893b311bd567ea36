//! Single-column conditions.
//!
//! Text columns compared for equality use `COALESCE(UPPER(col), '')` on the
//! column side and `UPPER(value)` on the literal side, so matching ignores
//! case and a NULL cell behaves like the empty string. Values compared
//! against a text column are always rendered as string literals.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{QueryError, QueryResult};
use crate::filter::{parse_literal, Operator, Scalar, Value};
use crate::schema::ColumnDescriptor;
use crate::sql::{
    coalesce, lit_bool, lit_float, lit_int, lit_null, lit_str, table_col, upper, Expr, ExprExt,
};

static BETWEEN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("between separator is valid"));

/// Build the condition for `column <operator> value`, evaluated against
/// the column's own table.
pub fn compile_condition(
    column: &ColumnDescriptor,
    operator: Operator,
    value: &Value,
) -> QueryResult<Expr> {
    let target = table_col(&column.table, &column.name);
    let text_column = column.data_type.is_text();
    let literal = |scalar: &Scalar| literal_for(scalar, text_column);
    let mismatch = |expected: &str| QueryError::OperatorValueMismatch {
        operator: operator.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };

    let condition = match (operator, value) {
        (Operator::In, Value::List(items)) => target.in_list(items.iter().map(&literal).collect()),
        (Operator::NotIn, Value::List(items)) => {
            target.not_in_list(items.iter().map(&literal).collect())
        }
        (Operator::In | Operator::NotIn, Value::Scalar(_)) => {
            return Err(mismatch("a list of values"));
        }
        (_, Value::List(_)) => return Err(mismatch("a single value")),

        (Operator::Eq, Value::Scalar(Scalar::Null)) => target.is_null(),
        (Operator::Ne, Value::Scalar(Scalar::Null)) => target.is_not_null(),
        (Operator::Eq, Value::Scalar(scalar)) if text_column => {
            folded(target).eq(upper(literal(scalar)))
        }
        (Operator::Ne, Value::Scalar(scalar)) if text_column => {
            folded(target).ne(upper(literal(scalar)))
        }
        (Operator::Eq, Value::Scalar(scalar)) => target.eq(literal(scalar)),
        (Operator::Ne, Value::Scalar(scalar)) => target.ne(literal(scalar)),

        (Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte, Value::Scalar(Scalar::Null)) => {
            return Err(mismatch("a non-null value"));
        }
        (Operator::Lt, Value::Scalar(scalar)) => target.lt(literal(scalar)),
        (Operator::Lte, Value::Scalar(scalar)) => target.lte(literal(scalar)),
        (Operator::Gt, Value::Scalar(scalar)) => target.gt(literal(scalar)),
        (Operator::Gte, Value::Scalar(scalar)) => target.gte(literal(scalar)),

        (Operator::Like | Operator::NotLike, Value::Scalar(scalar)) => {
            if !text_column {
                return Err(mismatch("a text column"));
            }
            if matches!(scalar, Scalar::Null) {
                return Err(mismatch("a pattern"));
            }
            let pattern = upper(lit_str(&scalar.to_string()));
            if operator == Operator::Like {
                folded(target).like(pattern)
            } else {
                folded(target).not_like(pattern)
            }
        }

        (Operator::Is | Operator::IsNot, Value::Scalar(scalar)) => {
            let negated = operator == Operator::IsNot;
            match scalar {
                Scalar::Null => Expr::IsNull {
                    expr: Box::new(target),
                    negated,
                },
                Scalar::Bool(b) => Expr::IsBool {
                    expr: Box::new(target),
                    value: *b,
                    negated,
                },
                _ => return Err(mismatch("null, true or false")),
            }
        }

        (Operator::Between | Operator::NotBetween, Value::Scalar(scalar)) => {
            let (low, high) = between_bounds(scalar).ok_or_else(|| mismatch("'<low> and <high>'"))?;
            if operator == Operator::Between {
                target.between(literal(&low), literal(&high))
            } else {
                target.not_between(literal(&low), literal(&high))
            }
        }
    };

    Ok(condition)
}

fn folded(column: Expr) -> Expr {
    coalesce(vec![upper(column), lit_str("")])
}

/// Text columns take every non-null value as a string literal.
fn literal_for(scalar: &Scalar, text_column: bool) -> Expr {
    match scalar {
        Scalar::Null => lit_null(),
        _ if text_column => lit_str(&scalar.to_string()),
        Scalar::Bool(b) => lit_bool(*b),
        Scalar::Int(n) => lit_int(*n),
        Scalar::Float(x) => lit_float(*x),
        Scalar::Text(s) => lit_str(s),
    }
}

/// Split `"<low> and <high>"` into two non-null literals.
fn between_bounds(scalar: &Scalar) -> Option<(Scalar, Scalar)> {
    let Scalar::Text(text) = scalar else {
        return None;
    };
    let parts: Vec<&str> = BETWEEN_SEPARATOR.split(text.trim()).collect();
    let [low, high] = parts.as_slice() else {
        return None;
    };
    let (low, high) = (parse_literal(low.trim()), parse_literal(high.trim()));
    if matches!(low, Scalar::Null) || matches!(high, Scalar::Null) {
        return None;
    }
    Some((low, high))
}
