//! Value → SQL literal encoding.
//!
//! Statements are built as plain strings, so this module is the only defense
//! against injection: text is single-quoted with embedded quotes doubled.
//!
//! A small set of raw SQL idioms is let through **unquoted** so callers can write
//! aggregates and expressions as values: `null`, `count(...)`, `sum(...)`,
//! `date(...)`, `now()`. The match runs on the lowercased text and cannot tell a
//! trusted expression from user data that happens to read the same; a value of
//! `"now()"` is always the SQL function. Text that may come from users must not
//! reach the codec if it can match the pattern.

use crate::value::{DATETIME_FORMAT, Value};
use regex::Regex;
use std::sync::LazyLock;

// Alternation binds loosest: `null` is start-anchored, `now()` end-anchored, and the
// aggregates match anywhere in the text.
static RAW_SQL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(null)|(count\(.+\))|(sum\(.+\))|date\(.+\)|now\(\)$")
        .expect("invalid built-in raw SQL regex")
});

/// Encodes values as SQL literal tokens.
///
/// Swap the implementation to change how values reach SQL without touching the
/// clause builder or the mapper.
pub trait Codec: Send + Sync {
    fn quote(&self, value: &Value) -> String;
}

/// The literal-inlining codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralCodec;

impl Codec for LiteralCodec {
    fn quote(&self, value: &Value) -> String {
        quote(value)
    }
}

/// Encode a value as a SQL literal token.
pub fn quote(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Real(f) if f.is_finite() => f.to_string(),
        Value::Real(f) => quote_text(&f.to_string()),
        Value::Text(s) if is_raw_sql(s) => s.clone(),
        Value::Text(s) => quote_text(s),
        Value::DateTime(d) => quote_text(&d.format(DATETIME_FORMAT).to_string()),
    }
}

/// Whether text is passed through to SQL as a raw expression.
pub fn is_raw_sql(text: &str) -> bool {
    RAW_SQL.is_match(&text.to_lowercase())
}

fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(quote(&Value::Int(5)), "5");
        assert_eq!(quote(&Value::Int(-12)), "-12");
        assert_eq!(quote(&Value::Real(1.5)), "1.5");
        assert_eq!(quote(&Value::Bool(true)), "1");
    }

    #[test]
    fn text_is_quoted_and_escaped() {
        assert_eq!(quote(&text("abdul")), "'abdul'");
        assert_eq!(quote(&text("O'Brien")), "'O''Brien'");
        assert_eq!(quote(&text("'; DROP TABLE t; --")), "'''; DROP TABLE t; --'");
        assert_eq!(quote(&text("")), "''");
    }

    #[test]
    fn numeric_looking_text_stays_text() {
        assert_eq!(quote(&text("42")), "'42'");
    }

    #[test]
    fn raw_sql_idioms_pass_through() {
        assert_eq!(quote(&text("now()")), "now()");
        assert_eq!(quote(&text("NOW()")), "NOW()");
        assert_eq!(quote(&text("null")), "null");
        assert_eq!(quote(&text("count(id)")), "count(id)");
        assert_eq!(quote(&text("sum(price)")), "sum(price)");
        assert_eq!(quote(&text("date('now')")), "date('now')");
    }

    #[test]
    fn built_in_raw_sql_pattern_compiles() {
        assert!(LazyLock::force(&RAW_SQL).is_match("sum(total)"));
    }

    #[test]
    fn raw_sql_match_keeps_its_loose_anchoring() {
        // Start-anchored only.
        assert!(is_raw_sql("nullable"));
        // Aggregates match anywhere.
        assert!(is_raw_sql("total: count(x) items"));
        // End-anchored only.
        assert!(is_raw_sql("select now()"));
        assert!(!is_raw_sql("now() later"));
        assert!(!is_raw_sql("count()"));
    }

    #[test]
    fn nulls_and_dates() {
        assert_eq!(quote(&Value::Null), "null");
        let d = NaiveDate::from_ymd_opt(2016, 5, 4)
            .unwrap()
            .and_hms_opt(10, 11, 12)
            .unwrap();
        assert_eq!(quote(&Value::DateTime(d)), "'2016-05-04 10:11:12'");
    }

    #[test]
    fn non_finite_reals_are_quoted() {
        assert_eq!(quote(&Value::Real(f64::NAN)), "'NaN'");
    }

    #[test]
    fn codec_trait_delegates() {
        let codec: &dyn Codec = &LiteralCodec;
        assert_eq!(codec.quote(&text("x")), "'x'");
    }
}
