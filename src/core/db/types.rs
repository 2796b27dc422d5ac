/// Value and Type Tag Module
///
/// Defines the values that flow in and out of statements, the argument type
/// tags that decide how a value is bound, and the column type tags that
/// decide how a result column is decoded.
use crate::core::error::{DriverError, DriverResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

/// A single argument or decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value into the representation its declared argument
    /// type requires. `position` is the 1-based bind position, used only
    /// for error reporting.
    pub fn coerce(&self, sql_type: SqlType, position: usize) -> DriverResult<Value> {
        let fail = |reason: String| DriverError::Bind {
            position,
            sql_type,
            reason,
        };

        if self.is_null() {
            return Ok(Value::Null);
        }

        let coerced = match sql_type {
            SqlType::Other => self.clone(),
            SqlType::Boolean => Value::Bool(match self {
                Value::Bool(b) => *b,
                Value::Int(i) => *i != 0,
                Value::BigInt(i) => *i != 0,
                Value::Text(s) => {
                    parse_bool(s).ok_or_else(|| fail(format!("'{s}' is not a boolean")))?
                }
                other => return Err(fail(format!("{} is not a boolean", other.kind()))),
            }),
            SqlType::Integer => {
                let wide = self.as_i64().ok_or_else(|| fail(self.not_integral()))?;
                let narrow = i32::try_from(wide)
                    .map_err(|_| fail(format!("{wide} overflows a 32-bit integer")))?;
                Value::Int(narrow)
            }
            SqlType::BigInt => {
                Value::BigInt(self.as_i64().ok_or_else(|| fail(self.not_integral()))?)
            }
            SqlType::Real => Value::Float(
                self.as_f64()
                    .ok_or_else(|| fail(format!("{} is not numeric", self.kind())))? as f32,
            ),
            SqlType::Double => Value::Double(
                self.as_f64()
                    .ok_or_else(|| fail(format!("{} is not numeric", self.kind())))?,
            ),
            SqlType::Varchar => match self {
                Value::Text(s) => Value::Text(s.clone()),
                Value::Bytes(b) => Value::Text(
                    String::from_utf8(b.clone()).map_err(|e| fail(e.to_string()))?,
                ),
                other => Value::Text(other.to_string()),
            },
            SqlType::Date => Value::Date(self.as_timestamp(&fail)?.date()),
            SqlType::Time => match self {
                Value::Time(t) => Value::Time(*t),
                Value::Text(s) => Value::Time(
                    parse_time(s).ok_or_else(|| fail(format!("'{s}' is not a time")))?,
                ),
                other => Value::Time(other.as_timestamp(&fail)?.time()),
            },
            SqlType::Timestamp => Value::Timestamp(self.as_timestamp(&fail)?),
            SqlType::Blob => match self {
                Value::Bytes(b) => Value::Bytes(b.clone()),
                Value::Text(s) => Value::Bytes(s.clone().into_bytes()),
                other => return Err(fail(format!("{} is not binary", other.kind()))),
            },
        };
        Ok(coerced)
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "real",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Bytes(_) => "blob",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
        }
    }

    fn not_integral(&self) -> String {
        format!("{} '{}' is not an integer", self.kind(), self)
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::BigInt(i) => Some(*i),
            Value::Float(f) => integral(f64::from(*f)),
            Value::Double(f) => integral(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(f64::from(*i)),
            Value::BigInt(i) => Some(*i as f64),
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integers are read as epoch milliseconds.
    fn as_timestamp(&self, fail: &dyn Fn(String) -> DriverError) -> DriverResult<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            Value::Text(s) => {
                parse_timestamp(s).ok_or_else(|| fail(format!("'{s}' is not a date or timestamp")))
            }
            Value::Int(_) | Value::BigInt(_) => {
                let millis = self.as_i64().unwrap_or_default();
                DateTime::from_timestamp_millis(millis)
                    .map(|dt| dt.naive_utc())
                    .ok_or_else(|| fail(format!("{millis} ms is out of range")))
            }
            other => Err(fail(format!("{} is not temporal", other.kind()))),
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::BigInt(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Declared type of a bound argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    /// 32-bit integer
    Integer,
    BigInt,
    /// 32-bit float
    Real,
    Double,
    Varchar,
    Date,
    Time,
    Timestamp,
    Blob,
    /// Bound as given, without conversion
    Other,
}

impl SqlType {
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Boolean => "boolean",
            SqlType::Integer => "integer",
            SqlType::BigInt => "bigint",
            SqlType::Real => "real",
            SqlType::Double => "double",
            SqlType::Varchar => "varchar",
            SqlType::Date => "date",
            SqlType::Time => "time",
            SqlType::Timestamp => "timestamp",
            SqlType::Blob => "blob",
            SqlType::Other => "other",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" | "bit" => SqlType::Boolean,
            "integer" | "int" | "smallint" | "tinyint" => SqlType::Integer,
            "bigint" => SqlType::BigInt,
            "real" | "float" => SqlType::Real,
            "double" => SqlType::Double,
            "varchar" | "char" | "text" | "longvarchar" => SqlType::Varchar,
            "date" => SqlType::Date,
            "time" => SqlType::Time,
            "timestamp" | "datetime" => SqlType::Timestamp,
            "blob" | "binary" | "varbinary" => SqlType::Blob,
            "other" | "object" => SqlType::Other,
            _ => return Err(s.to_string()),
        };
        Ok(ty)
    }
}

/// Declared type of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum ColumnType {
    /// Read as a timestamp and reduced to its date
    Temporal,
    Double,
    Float,
    Int64,
    Int32,
    Text,
    Boolean,
    /// Whatever the driver returns, unconverted
    Any,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Temporal => "temporal",
            ColumnType::Double => "double",
            ColumnType::Float => "float",
            ColumnType::Int64 => "int64",
            ColumnType::Int32 => "int32",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Any => "any",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "temporal" | "date" | "timestamp" => ColumnType::Temporal,
            "double" | "f64" => ColumnType::Double,
            "float" | "f32" => ColumnType::Float,
            "int64" | "i64" | "long" | "bigint" => ColumnType::Int64,
            "int32" | "i32" | "int" | "integer" => ColumnType::Int32,
            "text" | "string" => ColumnType::Text,
            "boolean" | "bool" => ColumnType::Boolean,
            "any" | "object" | "opaque" => ColumnType::Any,
            _ => return Err(s.to_string()),
        };
        Ok(ty)
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Reads the textual spellings of a boolean accepted both when binding
/// arguments and when decoding boolean columns.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parses the textual date/time forms SQLite and ISO-8601 use. A bare date
/// is taken at midnight; an explicit offset is normalized to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}
