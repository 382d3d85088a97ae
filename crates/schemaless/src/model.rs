//! The persistable-entity contract.
//!
//! A model is a struct whose fields map one-to-one onto table columns. The
//! `#[derive(Model)]` macro implements [`Model`] and generates typed accessors;
//! the by-name methods here exist for hydration and association lookups.
//!
//! ```ignore
//! #[derive(Debug, Clone, Default, Model)]
//! #[orm(table = "User")]
//! struct User {
//!     id: i64,
//!     #[orm(required, ddl = "int not null")]
//!     group_id: i64,
//!     name: String,
//!     signup_date: Option<NaiveDateTime>,
//! }
//!
//! let user = User::from_record(record! { "groupId" => 5, "name" => "Abdul" })?;
//! assert_eq!(user.group_id(), 5);
//! ```

use crate::error::{OrmError, OrmResult};
use crate::schema::ColumnType;
use crate::value::{FromValue, Record, Value};

/// Declaration of one model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub name: &'static str,
    /// Column name in the table and in records.
    pub column: &'static str,
    pub column_type: ColumnType,
    /// Must be present in construction data.
    pub required: bool,
    pub primary_key: bool,
}

/// A persistable entity type.
pub trait Model: Sized + Send + Sync + 'static {
    /// Model name used in error messages.
    const MODEL: &'static str;
    const TABLE: &'static str;
    /// Column name of the primary key.
    const PRIMARY_KEY: &'static str;

    /// Field declarations in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Build a model from construction data or a fetched row.
    ///
    /// Every required column must be present and every supplied column declared;
    /// both are checked before any field is assigned. Absent optional fields take
    /// their type's default.
    fn from_record(record: Record) -> OrmResult<Self>;

    /// All fields, primary key included, in declaration order.
    fn to_record(&self) -> Record;

    /// Read a field by column name.
    fn get(&self, column: &str) -> OrmResult<Value>;

    /// Assign a field by column name, coercing the value to the field type.
    fn set(&mut self, column: &str, value: Value) -> OrmResult<()>;

    /// The primary key, if one has been assigned (zero and null read as unset).
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Whether the store has assigned this model an identifier.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    /// Declaration of the field stored in `column`.
    fn field(column: &str) -> Option<&'static FieldDef> {
        Self::fields().iter().find(|f| f.column == column)
    }

    fn has_field(column: &str) -> bool {
        Self::field(column).is_some()
    }
}

/// Primary-key field types.
pub trait IdField {
    fn to_id(&self) -> Option<i64>;
    fn from_id(id: i64) -> Self;
}

impl IdField for i64 {
    fn to_id(&self) -> Option<i64> {
        (*self != 0).then_some(*self)
    }

    fn from_id(id: i64) -> Self {
        id
    }
}

impl IdField for Option<i64> {
    fn to_id(&self) -> Option<i64> {
        self.filter(|id| *id != 0)
    }

    fn from_id(id: i64) -> Self {
        Some(id)
    }
}

/// Check construction data against a model's declarations.
pub fn validate_record<M: Model>(record: &Record) -> OrmResult<()> {
    if let Some(missing) = M::fields()
        .iter()
        .find(|f| f.required && !record.contains_key(f.column))
    {
        return Err(OrmError::MissingRequiredField {
            model: M::MODEL.to_string(),
            field: missing.column.to_string(),
        });
    }
    if let Some(undeclared) = record.keys().find(|key| !M::has_field(key)) {
        return Err(OrmError::UndeclaredField {
            model: M::MODEL.to_string(),
            field: undeclared.clone(),
        });
    }
    Ok(())
}

/// Remove a column from a record and convert it to the field type.
///
/// An absent column or a SQL `NULL` takes the type's default, so a nullable
/// column backed by a plain `String` reads as `""` and an `Option` as `None`.
pub fn take_field<T: FromValue + Default>(record: &mut Record, column: &str) -> OrmResult<T> {
    match record.shift_remove(column) {
        Some(Value::Null) | None => Ok(T::default()),
        Some(value) => value.decode(column),
    }
}

/// Lowercase the first character.
pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Foreign-key column another model uses to point at `A`: `lcfirst(table) + "Id"`.
pub fn foreign_key_for<A: Model>() -> String {
    format!("{}Id", lcfirst(A::TABLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcfirst_lowers_only_the_first_char() {
        assert_eq!(lcfirst("User"), "user");
        assert_eq!(lcfirst("OrderLine"), "orderLine");
        assert_eq!(lcfirst(""), "");
    }

    #[test]
    fn ids_treat_zero_as_unset() {
        assert_eq!(0i64.to_id(), None);
        assert_eq!(23i64.to_id(), Some(23));
        assert_eq!(Some(0i64).to_id(), None);
        assert_eq!(None::<i64>.to_id(), None);
        assert_eq!(<Option<i64>>::from_id(4), Some(4));
    }

    #[test]
    fn take_field_defaults_absent_columns() {
        let mut record = crate::record! { "name" => "Abdul" };
        let name: String = take_field(&mut record, "name").unwrap();
        let user_id: i64 = take_field(&mut record, "userId").unwrap();
        assert_eq!(name, "Abdul");
        assert_eq!(user_id, 0);
        assert!(record.is_empty());
    }

    #[test]
    fn take_field_reads_null_as_default() {
        let mut record = crate::record! {
            "name" => Value::Null,
            "score" => Value::Null,
            "active" => Value::Null,
            "nickname" => Value::Null,
        };
        let name: String = take_field(&mut record, "name").unwrap();
        let score: f64 = take_field(&mut record, "score").unwrap();
        let active: bool = take_field(&mut record, "active").unwrap();
        let nickname: Option<String> = take_field(&mut record, "nickname").unwrap();
        assert_eq!(name, "");
        assert_eq!(score, 0.0);
        assert!(!active);
        assert_eq!(nickname, None);
    }
}
