//! Error types for schemaless

use std::time::Duration;
use thiserror::Error;

/// Result type alias for schemaless operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for mapping and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The model type does not satisfy the persistable-entity contract
    #[error("Invalid model '{model}': {reason}")]
    InvalidModel { model: String, reason: String },

    /// A required field was absent from construction data
    #[error("Expected to have field '{field}' on provided data for model '{model}'")]
    MissingRequiredField { model: String, field: String },

    /// Construction data referenced a field the model never declared
    #[error("Property '{field}' is not defined on model '{model}' but was provided in data")]
    UndeclaredField { model: String, field: String },

    /// By-name access referenced a field the model never declared
    #[error("Property '{property}' not found on model '{model}'")]
    UnknownProperty { model: String, property: String },

    /// The naming-convention foreign key is not declared on the source model
    #[error("Property '{field}' does not exist on model '{model}' and is not associated")]
    MissingAssociation { model: String, field: String },

    /// Delete-by-instance on a model without an assigned primary key
    #[error("Model '{0}' must have an id to perform this operation")]
    MissingIdentifier(String),

    /// Store configured with an engine kind we cannot drive
    #[error("Database engine '{0}' is not supported")]
    UnsupportedEngine(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error reported by PostgreSQL
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Statement execution error reported by SQLite
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Execution error reported by any other executor
    #[error("Execution error: {0}")]
    Execution(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pool error
    #[cfg(feature = "postgres")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl OrmError {
    /// Create an invalid model error
    pub fn invalid_model(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidModel {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unknown property error
    pub fn unknown_property(model: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            model: model.into(),
            property: property.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if the store reported a fault while running generated SQL.
    ///
    /// Timeouts count: they are enforced at the store boundary.
    pub fn is_execution(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Query(_) => true,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => true,
            Self::Execution(_) | Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Check if this is an invalid model error
    pub fn is_invalid_model(&self) -> bool {
        matches!(self, Self::InvalidModel { .. })
    }

    /// Check if this is a missing identifier error
    pub fn is_missing_identifier(&self) -> bool {
        matches!(self, Self::MissingIdentifier(_))
    }

    /// Check if this is a missing association error
    pub fn is_missing_association(&self) -> bool {
        matches!(self, Self::MissingAssociation { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Parse a tokio_postgres error, keeping connection-level faults apart.
    #[cfg(feature = "postgres")]
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if err.as_db_error().is_none() && err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
