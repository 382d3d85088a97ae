//! Convenient imports for typical `schemaless` usage.
//!
//! ```ignore
//! use schemaless::prelude::*;
//! ```

pub use crate::{
    Criteria, Direction, Mapper, Model, OrderBy, OrmError, OrmResult, Record, SqlStore, Store,
    StoreConfig, Value, record,
};

#[cfg(feature = "postgres")]
pub use crate::{GenericClient, PgExecutor, create_pool};

#[cfg(feature = "sqlite")]
pub use crate::SqliteExecutor;
