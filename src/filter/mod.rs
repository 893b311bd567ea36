//! Filter expressions: `<column> <operator> <value>`.
//!
//! Requests carry two lists of filter strings. Each string parses into a
//! [`Predicate`]; the lists form a [`FilterSet`] whose `match_all` group is
//! conjoined and whose `match_some` group is disjoined.

mod parser;

pub use parser::parse_filter;
pub(crate) use parser::parse_literal;

use std::fmt;

use crate::error::QueryResult;

/// Filter operators, in their canonical spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Is,
    IsNot,
    In,
    NotIn,
    Like,
    NotLike,
    Between,
    NotBetween,
}

impl Operator {
    /// Parse an operator token. Case-insensitive; `not x`, `not_x` and
    /// `<>` are accepted alongside the canonical forms.
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_lowercase();
        let op = match normalized.as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "is" => Operator::Is,
            "is_not" => Operator::IsNot,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "like" => Operator::Like,
            "not_like" => Operator::NotLike,
            "between" => Operator::Between,
            "not_between" => Operator::NotBetween,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Is => "is",
            Operator::IsNot => "is_not",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Like => "like",
            Operator::NotLike => "not_like",
            Operator::Between => "between",
            Operator::NotBetween => "not_between",
        }
    }

    /// `in` and `not_in` take a list; everything else a scalar.
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A parsed filter string.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Registry uniquename, not yet resolved.
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.value)
    }
}

/// Parsed `match_all` / `match_some` groups of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub match_all: Vec<Predicate>,
    pub match_some: Vec<Predicate>,
}

impl FilterSet {
    /// Parse both groups, failing on the first malformed filter.
    pub fn parse<A, S>(match_all: &[A], match_some: &[S]) -> QueryResult<Self>
    where
        A: AsRef<str>,
        S: AsRef<str>,
    {
        Ok(Self {
            match_all: match_all
                .iter()
                .map(|f| parse_filter(f.as_ref()))
                .collect::<QueryResult<_>>()?,
            match_some: match_some
                .iter()
                .map(|f| parse_filter(f.as_ref()))
                .collect::<QueryResult<_>>()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.match_all.is_empty() && self.match_some.is_empty()
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |preds: &[Predicate]| {
            preds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };
        write!(
            f,
            "match_all=[{}] match_some=[{}]",
            join(&self.match_all),
            join(&self.match_some)
        )
    }
}
