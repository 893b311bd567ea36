//! Shared helper functions for SQL dialect implementations.
//!
//! Both supported engines speak ANSI quoting and `LIMIT ... OFFSET ...`
//! pagination; they only diverge on JSON function names.

use super::super::token::{Token, TokenStream};

/// Quote identifier with double quotes (ANSI style).
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Format boolean as literal true/false.
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Emit LIMIT ... OFFSET ... (standard SQL).
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(Token::LitInt(saturating_i64(lim)));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(saturating_i64(off)));
    }

    ts
}

fn saturating_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Remap functions for the PostgreSQL dialect.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "JSON_OBJECT" => Some("JSON_BUILD_OBJECT"),
        "JSON_GROUP_ARRAY" => Some("JSON_AGG"),
        "IFNULL" | "NVL" => Some("COALESCE"),
        _ => None,
    }
}

/// Remap functions for the DuckDB dialect.
pub fn remap_function_duckdb(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "JSON_BUILD_OBJECT" => Some("JSON_OBJECT"),
        "JSON_AGG" => Some("JSON_GROUP_ARRAY"),
        "IFNULL" | "NVL" => Some("COALESCE"),
        _ => None,
    }
}
