//! Statement executors: the engine-specific half of a [`SqlStore`](crate::SqlStore).
//!
//! An executor runs finished SQL text and converts rows into [`Record`]s. It
//! knows nothing about models or clauses.

use crate::error::OrmResult;
use crate::ident::Dialect;
use crate::value::Record;
use std::future::Future;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PgExecutor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

/// Runs SQL against one database engine.
pub trait Executor: Send + Sync {
    /// The SQL flavour this executor expects.
    fn dialect(&self) -> Dialect;

    /// Run a statement and return its rows (none for DDL and writes).
    fn query(&self, sql: &str) -> impl Future<Output = OrmResult<Vec<Record>>> + Send;

    /// Run an INSERT and return the identifier the engine assigned to `primary_key`.
    fn insert(&self, sql: &str, primary_key: &str)
    -> impl Future<Output = OrmResult<i64>> + Send;
}

impl<E: Executor> Executor for &E {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Record>> {
        (**self).query(sql).await
    }

    async fn insert(&self, sql: &str, primary_key: &str) -> OrmResult<i64> {
        (**self).insert(sql, primary_key).await
    }
}

/// An executor whose engine is picked at runtime from configuration.
#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub enum EngineExecutor {
    #[cfg(feature = "postgres")]
    Postgres(PgExecutor<deadpool_postgres::Pool>),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteExecutor),
}

#[cfg(any(feature = "postgres", feature = "sqlite"))]
impl std::fmt::Debug for EngineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EngineExecutor")
            .field(&self.dialect())
            .finish()
    }
}

#[cfg(any(feature = "postgres", feature = "sqlite"))]
impl Executor for EngineExecutor {
    fn dialect(&self) -> Dialect {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.dialect(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(e) => e.dialect(),
        }
    }

    async fn query(&self, sql: &str) -> OrmResult<Vec<Record>> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.query(sql).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(e) => e.query(sql).await,
        }
    }

    async fn insert(&self, sql: &str, primary_key: &str) -> OrmResult<i64> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.insert(sql, primary_key).await,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(e) => e.insert(sql, primary_key).await,
        }
    }
}
