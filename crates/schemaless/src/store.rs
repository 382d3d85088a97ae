//! The statement-level store contract and its SQL implementation.
//!
//! [`Store`] is what the [`Mapper`](crate::Mapper) talks to: table-level CRUD in
//! terms of records and criteria. [`SqlStore`] implements it by rendering SQL
//! with a [`ClauseBuilder`] and handing the text to an [`Executor`].

use crate::clause::{ClauseBuilder, Criteria, OrderBy, join_sql};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::ident::Dialect;
use crate::value::Record;
use std::future::Future;
use std::time::Duration;

/// Maximum SQL length (in bytes) written to log events.
#[cfg(feature = "tracing")]
const MAX_LOGGED_SQL: usize = 200;

/// Table-level persistence operations.
///
/// All methods may fail with an execution error, which callers receive unchanged.
pub trait Store: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Run a raw statement.
    fn execute(&self, sql: &str) -> impl Future<Output = OrmResult<Vec<Record>>> + Send;

    /// Insert a row and return the identifier assigned to `primary_key`.
    fn save(
        &self,
        table: &str,
        primary_key: &str,
        values: &Record,
    ) -> impl Future<Output = OrmResult<i64>> + Send;

    fn update(
        &self,
        table: &str,
        values: &Record,
        criteria: &Criteria,
    ) -> impl Future<Output = OrmResult<()>> + Send;

    /// Delete matching rows; empty criteria delete every row.
    fn delete(&self, table: &str, criteria: &Criteria)
    -> impl Future<Output = OrmResult<()>> + Send;

    fn get(
        &self,
        table: &str,
        criteria: &Criteria,
        order: Option<&OrderBy>,
        limit: Option<u64>,
    ) -> impl Future<Output = OrmResult<Vec<Record>>> + Send;

    fn get_all(
        &self,
        table: &str,
        order: Option<&OrderBy>,
        limit: Option<u64>,
    ) -> impl Future<Output = OrmResult<Vec<Record>>> + Send {
        async move { self.get(table, &Criteria::new(), order, limit).await }
    }

    /// First matching row, if any.
    fn get_single(
        &self,
        table: &str,
        criteria: &Criteria,
        order: Option<&OrderBy>,
    ) -> impl Future<Output = OrmResult<Option<Record>>> + Send {
        async move {
            let rows = self.get(table, criteria, order, Some(1)).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Number of matching rows, counted over `primary_key`.
    fn get_count(
        &self,
        table: &str,
        primary_key: &str,
        criteria: &Criteria,
    ) -> impl Future<Output = OrmResult<i64>> + Send;
}

/// Column alias of a count query: `<table>Count`.
pub fn count_alias(table: &str) -> String {
    format!("{table}Count")
}

/// A [`Store`] that renders SQL and runs it on an [`Executor`].
///
/// ```ignore
/// let store = SqlStore::new(SqliteExecutor::open("app.db")?)
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct SqlStore<E> {
    executor: E,
    clauses: ClauseBuilder,
    timeout: Option<Duration>,
}

impl<E: Executor> SqlStore<E> {
    pub fn new(executor: E) -> Self {
        let clauses = ClauseBuilder::new(executor.dialect());
        Self {
            executor,
            clauses,
            timeout: None,
        }
    }

    /// Fail statements that run longer than `timeout` with [`OrmError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn clauses(&self) -> &ClauseBuilder {
        &self.clauses
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn table(&self, table: &str) -> String {
        self.clauses.quote_ident(table)
    }

    fn select_sql(
        &self,
        table: &str,
        criteria: &Criteria,
        order: Option<&OrderBy>,
        limit: Option<u64>,
    ) -> String {
        let from = format!("SELECT * FROM {}", self.table(table));
        join_sql([
            from.as_str(),
            self.clauses.where_clause(criteria).as_str(),
            self.clauses.order_clause(order).as_str(),
            self.clauses.limit_clause(limit).as_str(),
        ])
    }

    async fn run_query(&self, sql: &str) -> OrmResult<Vec<Record>> {
        log_sql(sql);
        let result = self.timed(self.executor.query(sql)).await;
        log_failure(sql, &result);
        result
    }

    async fn run_insert(&self, sql: &str, primary_key: &str) -> OrmResult<i64> {
        log_sql(sql);
        let result = self.timed(self.executor.insert(sql, primary_key)).await;
        log_failure(sql, &result);
        result
    }

    async fn timed<T>(&self, fut: impl Future<Output = OrmResult<T>>) -> OrmResult<T> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| OrmError::Timeout(timeout))?,
            None => fut.await,
        }
    }
}

impl<E: Executor> Store for SqlStore<E> {
    fn dialect(&self) -> Dialect {
        self.clauses.dialect()
    }

    async fn execute(&self, sql: &str) -> OrmResult<Vec<Record>> {
        self.run_query(sql).await
    }

    async fn save(&self, table: &str, primary_key: &str, values: &Record) -> OrmResult<i64> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table(table))
        } else {
            let (columns, literals) = self.clauses.insert_columns_and_values(values);
            format!("INSERT INTO {} {columns} VALUES {literals}", self.table(table))
        };
        self.run_insert(&sql, primary_key).await
    }

    async fn update(&self, table: &str, values: &Record, criteria: &Criteria) -> OrmResult<()> {
        if values.is_empty() {
            return Err(OrmError::execution(format!(
                "UPDATE on '{table}' requires at least one column"
            )));
        }
        let set = format!(
            "UPDATE {} SET {}",
            self.table(table),
            self.clauses.update_set_clause(values)
        );
        let sql = join_sql([set.as_str(), self.clauses.where_clause(criteria).as_str()]);
        self.run_query(&sql).await.map(drop)
    }

    async fn delete(&self, table: &str, criteria: &Criteria) -> OrmResult<()> {
        let from = format!("DELETE FROM {}", self.table(table));
        let sql = join_sql([from.as_str(), self.clauses.where_clause(criteria).as_str()]);
        self.run_query(&sql).await.map(drop)
    }

    async fn get(
        &self,
        table: &str,
        criteria: &Criteria,
        order: Option<&OrderBy>,
        limit: Option<u64>,
    ) -> OrmResult<Vec<Record>> {
        let sql = self.select_sql(table, criteria, order, limit);
        self.run_query(&sql).await
    }

    async fn get_count(
        &self,
        table: &str,
        primary_key: &str,
        criteria: &Criteria,
    ) -> OrmResult<i64> {
        let alias = count_alias(table);
        let select = format!(
            "SELECT count({}) AS {} FROM {}",
            self.clauses.quote_ident(primary_key),
            self.clauses.quote_ident(&alias),
            self.table(table)
        );
        let sql = join_sql([select.as_str(), self.clauses.where_clause(criteria).as_str()]);
        let rows = self.run_query(&sql).await?;
        rows.first()
            .and_then(|row| row.get(&alias))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| OrmError::decode(alias.as_str(), "count query returned no integer"))
    }
}

#[cfg(any(feature = "postgres", feature = "sqlite"))]
impl SqlStore<crate::executor::EngineExecutor> {
    /// Build a store for the configured engine.
    ///
    /// PostgreSQL stores get a connection pool, opened lazily; SQLite stores open
    /// `path`, or an in-memory database when no path is set.
    pub fn connect(config: &crate::config::StoreConfig) -> OrmResult<Self> {
        use crate::config::Engine;
        use crate::executor::EngineExecutor;

        config.validate()?;
        let executor = match config.engine()? {
            #[cfg(feature = "sqlite")]
            Engine::Sqlite => EngineExecutor::Sqlite(match &config.path {
                Some(path) => crate::executor::SqliteExecutor::open(path)?,
                None => crate::executor::SqliteExecutor::open_in_memory()?,
            }),
            #[cfg(feature = "postgres")]
            Engine::Postgres => EngineExecutor::Postgres(crate::executor::PgExecutor::new(
                crate::pool::create_pool_from_config(config)?,
            )),
            #[allow(unreachable_patterns)]
            other => {
                return Err(OrmError::UnsupportedEngine(format!(
                    "{other:?} (feature disabled)"
                )));
            }
        };

        let store = Self::new(executor);
        Ok(match config.timeout() {
            Some(timeout) => store.with_timeout(timeout),
            None => store,
        })
    }
}

#[cfg(feature = "tracing")]
fn log_sql(sql: &str) {
    tracing::debug!(target: "schemaless.sql", sql = %truncate_sql(sql, MAX_LOGGED_SQL), "executing statement");
}

#[cfg(not(feature = "tracing"))]
fn log_sql(_sql: &str) {}

#[cfg(feature = "tracing")]
fn log_failure<T>(sql: &str, result: &OrmResult<T>) {
    if let Err(err) = result {
        tracing::warn!(
            target: "schemaless.sql",
            error = %err,
            sql = %truncate_sql(sql, MAX_LOGGED_SQL),
            "statement failed"
        );
    }
}

#[cfg(not(feature = "tracing"))]
fn log_failure<T>(_sql: &str, _result: &OrmResult<T>) {}

/// Truncate to at most `max_bytes`, on a char boundary, marking the cut.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn truncate_sql(sql: &str, max_bytes: usize) -> std::borrow::Cow<'_, str> {
    if sql.len() <= max_bytes {
        return std::borrow::Cow::Borrowed(sql);
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    std::borrow::Cow::Owned(format!("{}...", &sql[..end]))
}
