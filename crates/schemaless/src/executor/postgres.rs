use super::Executor;
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident::Dialect;
use crate::value::{Record, Value};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// Executes statements through any [`GenericClient`]: a connection, a
/// transaction, a pooled client or a pool.
#[derive(Debug, Clone)]
pub struct PgExecutor<C> {
    client: C,
}

impl<C: GenericClient> PgExecutor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C: GenericClient> Executor for PgExecutor<C> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Record>> {
        let rows = self.client.query(sql, &[]).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn insert(&self, sql: &str, primary_key: &str) -> OrmResult<i64> {
        let sql = match Dialect::Postgres.returning(primary_key) {
            Some(returning) => format!("{sql} {returning}"),
            None => sql.to_string(),
        };
        let rows = self.client.query(&sql, &[]).await?;
        let row = rows
            .first()
            .ok_or_else(|| OrmError::execution("INSERT returned no rows"))?;
        row_to_record(row)?
            .get(primary_key)
            .and_then(Value::as_i64)
            .ok_or_else(|| OrmError::decode(primary_key, "INSERT did not return an integer key"))
    }
}

fn row_to_record(row: &Row) -> OrmResult<Record> {
    let mut record = Record::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = match *column.type_() {
            Type::BOOL => get(row, idx, name, Value::Bool)?,
            Type::INT2 => get(row, idx, name, |v: i16| Value::Int(v.into()))?,
            Type::INT4 => get(row, idx, name, |v: i32| Value::Int(v.into()))?,
            Type::INT8 => get(row, idx, name, Value::Int)?,
            Type::FLOAT4 => get(row, idx, name, |v: f32| Value::Real(v.into()))?,
            Type::FLOAT8 => get(row, idx, name, Value::Real)?,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                get(row, idx, name, Value::Text)?
            }
            Type::TIMESTAMP => get(row, idx, name, Value::DateTime)?,
            Type::TIMESTAMPTZ => get(row, idx, name, |v: DateTime<Utc>| {
                Value::DateTime(v.naive_utc())
            })?,
            Type::DATE => get(row, idx, name, |v: NaiveDate| {
                Value::DateTime(v.and_time(NaiveTime::MIN))
            })?,
            ref other => {
                return Err(OrmError::decode(
                    name,
                    format!("unsupported column type '{other}'"),
                ));
            }
        };
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

fn get<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    name: &str,
    wrap: impl FnOnce(T) -> Value,
) -> OrmResult<Value> {
    row.try_get::<_, Option<T>>(idx)
        .map(|v| v.map_or(Value::Null, wrap))
        .map_err(|e| OrmError::decode(name, e.to_string()))
}
