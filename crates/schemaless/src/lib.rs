//! # schemaless
//!
//! A model-definition-first ORM: table schemas and CRUD SQL are derived from the
//! field declarations of plain structs, with no schema file.
//!
//! ## Features
//!
//! - **Declare once**: `#[derive(Model)]` turns a struct into a table, typed
//!   accessors, and a validated constructor
//! - **Default-driven DDL**: column types come from field types unless a field
//!   carries an explicit declaration (`#[orm(ddl = "int not null")]`)
//! - **Small CRUD surface**: equality filters, single-column ordering, limits
//! - **Two engines**: PostgreSQL (tokio-postgres, deadpool pools) and SQLite
//!   (rusqlite)
//!
//! ```ignore
//! use schemaless::prelude::*;
//!
//! #[derive(Debug, Clone, Default, Model)]
//! struct User {
//!     id: i64,
//!     #[orm(required, ddl = "int not null")]
//!     group_id: i64,
//!     #[orm(ddl = "text not null")]
//!     name: String,
//! }
//!
//! let mapper = Mapper::new(SqlStore::connect(&StoreConfig::load("store.toml")?)?);
//! mapper.create_table::<User>().await?;
//!
//! let mut user = User::from_record(record! { "groupId" => 1, "name" => "Abdul" })?;
//! mapper.persist(&mut user).await?;
//!
//! let users: Vec<User> = mapper
//!     .get(&Criteria::new().eq(User::COL_GROUP_ID, 1), Some(&OrderBy::desc("name")))
//!     .await?;
//! ```
//!
//! ## Values and quoting
//!
//! Statements carry their values inline as SQL literals; see [`codec`] for the
//! escaping rules and the raw-SQL pass-through.

extern crate self as schemaless;

pub mod clause;
pub mod codec;
pub mod config;
pub mod error;
pub mod executor;
pub mod ident;
pub mod mapper;
pub mod model;
pub mod prelude;
pub mod schema;
pub mod store;
pub mod value;

#[cfg(feature = "postgres")]
pub mod client;
#[cfg(feature = "postgres")]
pub mod pool;

pub use clause::{ClauseBuilder, Criteria, Direction, OrderBy};
pub use codec::{Codec, LiteralCodec, quote};
pub use config::{Engine, StoreConfig};
pub use error::{OrmError, OrmResult};
pub use executor::Executor;
pub use ident::Dialect;
pub use mapper::Mapper;
pub use model::{FieldDef, IdField, Model};
pub use schema::{ColumnSchema, ColumnType, ModelRegistration, SchemaRegistry, TableSchema, schema_of};
pub use store::{SqlStore, Store};
pub use value::{FromValue, Record, SqlType, Value};

#[cfg(any(feature = "postgres", feature = "sqlite"))]
pub use executor::EngineExecutor;

#[cfg(feature = "postgres")]
pub use client::GenericClient;
#[cfg(feature = "postgres")]
pub use executor::PgExecutor;
#[cfg(feature = "postgres")]
pub use pool::{create_pool, create_pool_from_config, create_pool_with_manager_config};

#[cfg(feature = "sqlite")]
pub use executor::SqliteExecutor;

#[cfg(feature = "derive")]
pub use schemaless_derive::Model;

// Re-exports used by derive-generated code
pub use inventory;

#[doc(hidden)]
pub mod __private {
    pub use crate::model::{take_field, validate_record};
}
