use super::Executor;
use crate::error::OrmResult;
use crate::ident::Dialect;
use crate::value::{Record, Value};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Executes statements on one SQLite connection.
///
/// The connection sits behind a mutex; statements run to completion on the
/// calling task while the lock is held.
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Raw access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> OrmResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&conn)?)
    }
}

impl Executor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Record>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            if stmt.column_count() == 0 {
                stmt.execute([])?;
                return Ok(Vec::new());
            }

            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Record::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    record.insert(name.clone(), to_value(row.get_ref(idx)?));
                }
                records.push(record);
            }
            Ok(records)
        })
    }

    async fn insert(&self, sql: &str, _primary_key: &str) -> OrmResult<i64> {
        self.with_conn(|conn| {
            conn.execute(sql, [])?;
            Ok(conn.last_insert_rowid())
        })
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
