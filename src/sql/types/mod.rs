use std::{fmt::Display, sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Atomic storage kinds a destination field can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Char,
    String,
    DateTime,
    DateTimeOffset,
    Duration,
    Uuid,
    /// Enumeration, carrying the enum's type name
    Enum(&'static str),
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Enum(name) => write!(f, "enum {}", name),
            kind => write!(f, "{:?}", kind),
        }
    }
}

/// Value-kind tag of a destination field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar(Kind),
    Array(Kind),
    /// Reference to a nested object; never read from a single column
    Object(&'static str),
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Scalar(kind) => write!(f, "{}", kind),
            ValueKind::Array(kind) => write!(f, "array of {}", kind),
            ValueKind::Object(name) => write!(f, "object {}", name),
        }
    }
}

/// Runtime value of one column in a raw row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The null marker
    #[default]
    Null,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Duration(Duration),
    Uuid(Uuid),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the kind of the value, or None if it's Null
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => ValueKind::Scalar(Kind::Boolean),
            Value::Byte(_) => ValueKind::Scalar(Kind::Byte),
            Value::SByte(_) => ValueKind::Scalar(Kind::SByte),
            Value::Int16(_) => ValueKind::Scalar(Kind::Int16),
            Value::UInt16(_) => ValueKind::Scalar(Kind::UInt16),
            Value::Int32(_) => ValueKind::Scalar(Kind::Int32),
            Value::UInt32(_) => ValueKind::Scalar(Kind::UInt32),
            Value::Int64(_) => ValueKind::Scalar(Kind::Int64),
            Value::UInt64(_) => ValueKind::Scalar(Kind::UInt64),
            Value::Float32(_) => ValueKind::Scalar(Kind::Float32),
            Value::Float64(_) => ValueKind::Scalar(Kind::Float64),
            Value::Decimal(_) => ValueKind::Scalar(Kind::Decimal),
            Value::Char(_) => ValueKind::Scalar(Kind::Char),
            Value::String(_) => ValueKind::Scalar(Kind::String),
            Value::Bytes(_) => ValueKind::Array(Kind::Byte),
            Value::DateTime(_) => ValueKind::Scalar(Kind::DateTime),
            Value::DateTimeOffset(_) => ValueKind::Scalar(Kind::DateTimeOffset),
            Value::Duration(_) => ValueKind::Scalar(Kind::Duration),
            Value::Uuid(_) => ValueKind::Scalar(Kind::Uuid),
            // Element kind of the first non-null item; an empty array reads as strings
            Value::Array(items) => match items.iter().find_map(Value::kind) {
                Some(ValueKind::Scalar(kind)) => ValueKind::Array(kind),
                _ => ValueKind::Array(Kind::String),
            },
        })
    }

    /// Integral payload widened to i128; booleans are not integers
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Byte(v) => Some(*v as i128),
            Value::SByte(v) => Some(*v as i128),
            Value::Int16(v) => Some(*v as i128),
            Value::UInt16(v) => Some(*v as i128),
            Value::Int32(v) => Some(*v as i128),
            Value::UInt32(v) => Some(*v as i128),
            Value::Int64(v) => Some(*v as i128),
            Value::UInt64(v) => Some(*v as i128),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) if *b => write!(f, "TRUE"),
            Value::Boolean(_) => write!(f, "FALSE"),
            Value::Byte(v) => write!(f, "{}", v),
            Value::SByte(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::String(v) => write!(f, "'{}'", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::DateTimeOffset(v) => write!(f, "{}", v),
            Value::Duration(v) => write!(f, "{:?}", v),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_value!(
    bool => Boolean,
    u8 => Byte,
    i8 => SByte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    char => Char,
    String => String,
    Vec<u8> => Bytes,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    Duration => Duration,
    Uuid => Uuid,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Column names shared by every row of one result set
pub type Columns = Arc<[String]>;

/// One raw result row: ordered (column name, value) pairs
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Columns,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Columns, values: Vec<Value>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(Error::Internal(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Number of fields in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Column name by index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Value by index
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(Value::is_null)
    }

    /// Moves a value out of the row, leaving the null marker behind
    pub fn take(&mut self, index: usize) -> Value {
        self.values
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
