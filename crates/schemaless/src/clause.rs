//! SQL clause construction from ordered column/value mappings.
//!
//! Every value goes through a [`Codec`]; every identifier through the
//! [`Dialect`]. Output order always follows input order.
//!
//! ```ignore
//! let clauses = ClauseBuilder::new(Dialect::Sqlite);
//! let criteria = Criteria::new().eq("a", 1).eq("b", "x");
//! assert_eq!(clauses.conditions(&criteria), "`a` = 1 AND `b` = 'x'");
//! ```

use crate::codec::{Codec, LiteralCodec};
use crate::ident::Dialect;
use crate::value::{Record, Value};
use indexmap::IndexMap;
use std::fmt;

/// Equality filters, ANDed together in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(IndexMap<String, Value>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`. A repeated column replaces the earlier value in place.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Record> for Criteria {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Single-column ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: Direction) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Direction::Desc)
    }
}

/// Builds clause fragments for one dialect.
#[derive(Debug, Clone, Default)]
pub struct ClauseBuilder<C = LiteralCodec> {
    dialect: Dialect,
    codec: C,
}

impl ClauseBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            codec: LiteralCodec,
        }
    }
}

impl<C: Codec> ClauseBuilder<C> {
    /// Use a custom value codec.
    pub fn with_codec(dialect: Dialect, codec: C) -> Self {
        Self { dialect, codec }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn quote_ident(&self, name: &str) -> String {
        self.dialect.quote_ident(name)
    }

    pub fn quote(&self, value: &Value) -> String {
        self.codec.quote(value)
    }

    /// `` `a` = 1 AND `b` = 'x' ``; empty criteria give an empty string.
    pub fn conditions(&self, criteria: &Criteria) -> String {
        self.assignments(criteria.iter(), " AND ")
    }

    /// `WHERE <conditions>`, or nothing for empty criteria.
    pub fn where_clause(&self, criteria: &Criteria) -> String {
        if criteria.is_empty() {
            return String::new();
        }
        format!("WHERE {}", self.conditions(criteria))
    }

    /// `` ORDER BY `col` asc ``, or nothing.
    pub fn order_clause(&self, order: Option<&OrderBy>) -> String {
        match order {
            Some(order) => format!(
                "ORDER BY {} {}",
                self.dialect.quote_ident(&order.column),
                order.direction
            ),
            None => String::new(),
        }
    }

    /// `` `c1` = v1, `c2` = v2 ``
    pub fn update_set_clause(&self, values: &Record) -> String {
        self.assignments(values.iter().map(|(k, v)| (k.as_str(), v)), ", ")
    }

    /// `` (`c1`, `c2`) `` and `(v1, v2)`, aligned position by position.
    pub fn insert_columns_and_values(&self, values: &Record) -> (String, String) {
        let mut columns = String::from("(");
        let mut literals = String::from("(");
        for (i, (column, value)) in values.iter().enumerate() {
            if i > 0 {
                columns.push_str(", ");
                literals.push_str(", ");
            }
            self.dialect.write_ident(&mut columns, column);
            literals.push_str(&self.codec.quote(value));
        }
        columns.push(')');
        literals.push(')');
        (columns, literals)
    }

    /// `LIMIT n`, or nothing.
    pub fn limit_clause(&self, limit: Option<u64>) -> String {
        limit.map(|n| format!("LIMIT {n}")).unwrap_or_default()
    }

    fn assignments<'a>(
        &self,
        pairs: impl Iterator<Item = (&'a str, &'a Value)>,
        separator: &str,
    ) -> String {
        let mut out = String::new();
        for (i, (column, value)) in pairs.enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            self.dialect.write_ident(&mut out, column);
            out.push_str(" = ");
            out.push_str(&self.codec.quote(value));
        }
        out
    }
}

/// Join non-empty SQL fragments with single spaces.
pub(crate) fn join_sql<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut sql = String::new();
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        if !sql.is_empty() {
            sql.push(' ');
        }
        sql.push_str(part);
    }
    sql
}
