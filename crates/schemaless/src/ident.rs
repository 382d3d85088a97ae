//! SQL identifier rendering per database dialect.
//!
//! Identifiers are wrapped in the dialect's quote characters so model columns may
//! collide with reserved words (`order`, `group`, ...). They are **not** escaped:
//! identifiers only ever come from model declarations, never from runtime input.
//!
//! - SQLite (default): `` `name` ``, primary key `integer PRIMARY KEY`
//! - PostgreSQL: `"name"`, 64-bit `bigint` / `double precision` columns and a
//!   `bigserial PRIMARY KEY`, matching the `i64` / `f64` values models carry

use crate::schema::ColumnType;
use std::borrow::Cow;

/// The SQL flavour a store speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Back-tick quoted identifiers; `integer PRIMARY KEY` aliases the rowid.
    #[default]
    Sqlite,
    /// Double-quote identifiers; identifiers generated by a sequence.
    Postgres,
}

impl Dialect {
    /// Render an identifier as SQL.
    pub fn quote_ident(self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.write_ident(&mut out, name);
        out
    }

    pub(crate) fn write_ident(self, out: &mut String, name: &str) {
        let quote = match self {
            Self::Sqlite => '`',
            Self::Postgres => '"',
        };
        out.push(quote);
        out.push_str(name);
        out.push(quote);
    }

    /// Render a column type declaration.
    pub fn column_ddl(self, column_type: &ColumnType) -> Cow<'static, str> {
        match (self, column_type) {
            (Self::Postgres, ColumnType::Integer) => Cow::Borrowed("bigint"),
            (Self::Postgres, ColumnType::Real) => Cow::Borrowed("double precision"),
            (Self::Postgres, ColumnType::PrimaryKey) => Cow::Borrowed("bigserial PRIMARY KEY"),
            (_, column_type) => Cow::Borrowed(column_type.ddl()),
        }
    }

    /// Suffix appended to an INSERT so the store returns the generated key, if the
    /// dialect needs one.
    pub fn returning(self, primary_key: &str) -> Option<String> {
        match self {
            Self::Sqlite => None,
            Self::Postgres => Some(format!("RETURNING {}", self.quote_ident(primary_key))),
        }
    }
}
