//! Scalar values, records, and conversions between Rust field types and SQL values.

use crate::error::{OrmError, OrmResult};
use crate::schema::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;

/// Text form used when a date/time value is written into SQL.
///
/// The fraction is printed only when non-zero (3, 6 or 9 digits).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One row, or one set of construction data: column name → value, in order.
pub type Record = IndexMap<String, Value>;

/// A typed SQL scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value, if it is (or losslessly reads as) an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a field type, attributing failures to `column`.
    pub fn decode<T: FromValue>(self, column: &str) -> OrmResult<T> {
        T::from_value(self).map_err(|message| OrmError::decode(column, message))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::DateTime(_) => "datetime",
        }
    }
}

// ==================== Rust → Value ====================

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::DateTime(v.and_time(NaiveTime::MIN))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v.naive_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ==================== Value → Rust ====================

/// Conversion from a [`Value`] into a model field type.
///
/// This is where set-time coercion happens, e.g. text into a date/time.
pub trait FromValue: Sized {
    /// Whether an `Option` of this type reads empty text as `None`.
    const EMPTY_TEXT_IS_NULL: bool = false;

    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T, String> {
    Err(format!("expected {expected}, got {}", value.kind()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value.as_i64() {
            Some(v) => Ok(v),
            None => mismatch("integer", &value),
        }
    }
}

macro_rules! from_value_narrow_int {
    ($($t:ty),*) => {
        $(impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, String> {
                let wide = i64::from_value(value)?;
                <$t>::try_from(wide).map_err(|e| format!("{wide} out of range: {e}"))
            }
        })*
    };
}

from_value_narrow_int!(i8, i16, i32, u8, u16, u32);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Real(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Text(s) => s.trim().parse().map_err(|e| format!("invalid real '{s}': {e}")),
            _ => mismatch("real", &value),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, String> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" => Ok(true),
                "0" | "false" | "f" | "" => Ok(false),
                other => Err(format!("invalid bool '{other}'")),
            },
            _ => mismatch("bool", &value),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Int(i) => Ok(i.to_string()),
            Value::Real(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_string()),
            Value::DateTime(d) => Ok(d.format(DATETIME_FORMAT).to_string()),
            Value::Null => mismatch("text", &Value::Null),
        }
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| format!("invalid date/time '{s}'"))
}

impl FromValue for NaiveDateTime {
    const EMPTY_TEXT_IS_NULL: bool = true;

    fn from_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::DateTime(d) => Ok(*d),
            Value::Text(s) => parse_datetime(s),
            Value::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|d| d.naive_utc())
                .ok_or_else(|| format!("timestamp {secs} out of range")),
            _ => mismatch("date/time", &value),
        }
    }
}

impl FromValue for NaiveDate {
    const EMPTY_TEXT_IS_NULL: bool = true;

    fn from_value(value: Value) -> Result<Self, String> {
        NaiveDateTime::from_value(value).map(|d| d.date())
    }
}

impl FromValue for DateTime<Utc> {
    const EMPTY_TEXT_IS_NULL: bool = true;

    fn from_value(value: Value) -> Result<Self, String> {
        NaiveDateTime::from_value(value).map(|d| d.and_utc())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            Value::Text(s) if T::EMPTY_TEXT_IS_NULL && s.is_empty() => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ==================== Column types ====================

/// Maps a Rust field type to the column type used when none is declared.
///
/// Implemented for the scalar types a model field may use; the derive macro
/// reads `<T as SqlType>::COLUMN_TYPE` for fields without `#[orm(ddl = "...")]`.
pub trait SqlType {
    const COLUMN_TYPE: ColumnType;
}

macro_rules! sql_type {
    ($column_type:expr => $($t:ty),*) => {
        $(impl SqlType for $t {
            const COLUMN_TYPE: ColumnType = $column_type;
        })*
    };
}

sql_type!(ColumnType::Integer => i8, i16, i32, i64, u8, u16, u32, bool);
sql_type!(ColumnType::Real => f32, f64);
sql_type!(ColumnType::Text => String, NaiveDateTime, NaiveDate, DateTime<Utc>);

impl<T: SqlType> SqlType for Option<T> {
    const COLUMN_TYPE: ColumnType = T::COLUMN_TYPE;
}

/// Build a [`Record`] from `column => value` pairs, keeping their order.
///
/// ```ignore
/// let data = record! { "userId" => 15, "name" => "Abdul" };
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::String::from($column), $crate::Value::from($value));
        )+
        record
    }};
}
