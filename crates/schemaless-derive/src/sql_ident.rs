use proc_macro2::Span;
use syn::{Error, LitStr, Result};

/// SQL type keywords an explicit column declaration must contain.
const TYPE_KEYWORDS: &[&str] = &[
    "int",
    "integer",
    "real",
    "text",
    "varchar",
    "char",
    "blob",
    "numeric",
    "decimal",
    "float",
    "double",
    "bool",
    "boolean",
    "date",
    "datetime",
    "timestamp",
    "time",
    "serial",
    "bigint",
    "smallint",
];

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn parse_sql_ident(lit: &LitStr, what: &str) -> Result<String> {
    parse_sql_ident_with_span(&lit.value(), lit.span(), what)
}

pub(crate) fn parse_sql_ident_with_span(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("{what} must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_string())
}

pub(crate) fn has_type_keyword(ddl: &str) -> bool {
    ddl.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| TYPE_KEYWORDS.contains(&word.to_ascii_lowercase().as_str()))
}

/// Validate an explicit column declaration.
pub(crate) fn parse_column_ddl(lit: &LitStr) -> Result<String> {
    let ddl = lit.value();
    let ddl = ddl.trim();
    if !has_type_keyword(ddl) {
        return Err(Error::new(
            lit.span(),
            format!("ddl \"{ddl}\" does not name a recognized SQL type (e.g. int, text, real)"),
        ));
    }
    Ok(ddl.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_sql_ident() {
        assert!(is_valid_sql_ident("userId"));
        assert!(is_valid_sql_ident("_hidden"));
        assert!(!is_valid_sql_ident("1st"));
        assert!(!is_valid_sql_ident("user id"));
        assert!(!is_valid_sql_ident(""));
    }

    #[test]
    fn test_has_type_keyword() {
        assert!(has_type_keyword("int not null"));
        assert!(has_type_keyword("TEXT NOT NULL"));
        assert!(has_type_keyword("varchar(32)"));
        assert!(!has_type_keyword("not null"));
        assert!(!has_type_keyword("pointer"));
    }
}
