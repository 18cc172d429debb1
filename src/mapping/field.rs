//! Field storage kinds and value coercion
//!
//! Every type that can sit in a mapped struct field implements [`Field`]:
//! its value-kind tag, nullability, the value it takes on the null marker
//! and how a raw column value is coerced into it.

use std::{any::type_name, time::Duration};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use uuid::Uuid;

use crate::{
    config::{EnumMembership, MapOptions},
    error::{Error, Result},
    mapping::{Mapped, TypeDescriptor},
    sql::types::{Kind, Value, ValueKind},
};

/// A destination field type
pub trait Field: Sized + Send + 'static {
    /// Whether the type has a "no value" state
    const NULLABLE: bool = false;

    fn kind() -> ValueKind;

    /// Value assigned when the column holds the null marker
    fn null() -> Self;

    /// Coerces a non-null raw value
    fn coerce(value: Value, options: &MapOptions) -> Result<Self>;

    fn to_value(&self) -> Value;
}

/// Reads a raw value into a field type, applying null-marker defaults
pub fn read<F: Field>(value: Value, options: &MapOptions) -> Result<F> {
    if value.is_null() {
        Ok(F::null())
    } else {
        F::coerce(value, options)
    }
}

/// Setter body shared by every generated accessor
pub fn assign<F: Field>(slot: &mut F, value: Value, options: &MapOptions) -> Result<()> {
    *slot = read(value, options)?;
    Ok(())
}

/// Integral view of a value: integers, integral floats/decimals and numeric text
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Float32(v) if v.fract() == 0.0 => Some(*v as i128),
        Value::Float64(v) if v.fract() == 0.0 => Some(*v as i128),
        Value::Decimal(d) if d.fract().is_zero() => d.to_i128(),
        Value::String(s) => s.trim().parse().ok(),
        v => v.as_integer(),
    }
}

fn float(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        Value::Decimal(d) => d.to_f64(),
        Value::String(s) => s.trim().parse().ok(),
        v => v.as_integer().map(|i| i as f64),
    }
}

macro_rules! impl_integer_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Field for $ty {
                fn kind() -> ValueKind {
                    ValueKind::Scalar(Kind::$kind)
                }

                fn null() -> Self {
                    0
                }

                fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
                    integer(&value)
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| Error::conversion(&value, Kind::$kind))
                }

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_integer_field!(
    i8 => SByte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
);

impl Field for u8 {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Byte)
    }

    fn null() -> Self {
        0
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        integer(&value)
            .and_then(|i| u8::try_from(i).ok())
            .ok_or_else(|| Error::conversion(&value, Kind::Byte))
    }

    fn to_value(&self) -> Value {
        Value::Byte(*self)
    }
}

impl Field for f64 {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Float64)
    }

    fn null() -> Self {
        0.0
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        float(&value).ok_or_else(|| Error::conversion(&value, Kind::Float64))
    }

    fn to_value(&self) -> Value {
        Value::Float64(*self)
    }
}

impl Field for f32 {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Float32)
    }

    fn null() -> Self {
        0.0
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        match value {
            Value::Float32(v) => Ok(v),
            v => float(&v)
                .map(|f| f as f32)
                .ok_or_else(|| Error::conversion(&v, Kind::Float32)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Float32(*self)
    }
}

impl Field for bool {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Boolean)
    }

    fn null() -> Self {
        false
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        match &value {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) => match s.trim().to_lowercase().as_ref() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(Error::conversion(&value, Kind::Boolean)),
            },
            v => v
                .as_integer()
                .map(|i| i != 0)
                .ok_or_else(|| Error::conversion(&value, Kind::Boolean)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl Field for Decimal {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Decimal)
    }

    fn null() -> Self {
        Decimal::ZERO
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        let decimal = match &value {
            Value::Decimal(d) => Some(*d),
            Value::Float32(f) => Decimal::try_from(*f).ok(),
            Value::Float64(f) => Decimal::try_from(*f).ok(),
            Value::String(s) => s.trim().parse().ok(),
            v => v
                .as_integer()
                .and_then(|i| Decimal::try_from_i128_with_scale(i, 0).ok()),
        };
        decimal.ok_or_else(|| Error::conversion(&value, Kind::Decimal))
    }

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl Field for char {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Char)
    }

    fn null() -> Self {
        '\0'
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        let c = match &value {
            Value::Char(c) => Some(*c),
            Value::String(s) => {
                let mut chars = s.chars();
                chars.next().filter(|_| chars.next().is_none())
            }
            v => v
                .as_integer()
                .and_then(|i| u32::try_from(i).ok())
                .and_then(char::from_u32),
        };
        c.ok_or_else(|| Error::conversion(&value, Kind::Char))
    }

    fn to_value(&self) -> Value {
        Value::Char(*self)
    }
}

impl Field for String {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::String)
    }

    /// Plain `String` has no absent state; the null marker reads as empty text
    fn null() -> Self {
        String::new()
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Char(c) => Ok(c.to_string()),
            Value::Bytes(bytes) => {
                String::from_utf8(bytes).map_err(|e| Error::conversion(e, Kind::String))
            }
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Array(_) => Err(Error::conversion(&value, Kind::String)),
            v => Ok(v.to_string()),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Field for NaiveDateTime {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::DateTime)
    }

    fn null() -> Self {
        NaiveDateTime::default()
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        let datetime = match &value {
            Value::DateTime(dt) => Some(*dt),
            Value::DateTimeOffset(dt) => Some(dt.naive_local()),
            Value::String(s) => s
                .parse()
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .ok(),
            _ => None,
        };
        datetime.ok_or_else(|| Error::conversion(&value, Kind::DateTime))
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl Field for DateTime<FixedOffset> {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::DateTimeOffset)
    }

    fn null() -> Self {
        DateTime::default()
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        let datetime = match &value {
            Value::DateTimeOffset(dt) => Some(*dt),
            Value::DateTime(dt) => Some(dt.and_utc().fixed_offset()),
            Value::String(s) => DateTime::parse_from_rfc3339(s).ok(),
            _ => None,
        };
        datetime.ok_or_else(|| Error::conversion(&value, Kind::DateTimeOffset))
    }

    fn to_value(&self) -> Value {
        Value::DateTimeOffset(*self)
    }
}

impl Field for Duration {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Duration)
    }

    fn null() -> Self {
        Duration::ZERO
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        match value {
            Value::Duration(d) => Ok(d),
            v => Err(Error::conversion(&v, Kind::Duration)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Duration(*self)
    }
}

impl Field for Uuid {
    fn kind() -> ValueKind {
        ValueKind::Scalar(Kind::Uuid)
    }

    fn null() -> Self {
        Uuid::nil()
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        let uuid = match &value {
            Value::Uuid(u) => Some(*u),
            Value::String(s) => Uuid::parse_str(s.trim()).ok(),
            Value::Bytes(b) => Uuid::from_slice(b).ok(),
            _ => None,
        };
        uuid.ok_or_else(|| Error::conversion(&value, Kind::Uuid))
    }

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl<T: Field> Field for Option<T> {
    const NULLABLE: bool = true;

    fn kind() -> ValueKind {
        T::kind()
    }

    fn null() -> Self {
        None
    }

    fn coerce(value: Value, options: &MapOptions) -> Result<Self> {
        T::coerce(value, options).map(Some)
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_value)
    }
}

/// Scalar field types that can also be array elements
pub trait ArrayElement: Field {
    fn from_array(value: Value, options: &MapOptions) -> Result<Vec<Self>> {
        match value {
            Value::Array(items) => items.into_iter().map(|v| read(v, options)).collect(),
            v => Err(Error::conversion(&v, Self::kind())),
        }
    }

    fn to_array(items: &[Self]) -> Value {
        Value::Array(items.iter().map(Field::to_value).collect())
    }
}

impl ArrayElement for u8 {
    fn from_array(value: Value, options: &MapOptions) -> Result<Vec<Self>> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Array(items) => items.into_iter().map(|v| read(v, options)).collect(),
            v => Err(Error::conversion(&v, ValueKind::Array(Kind::Byte))),
        }
    }

    fn to_array(items: &[Self]) -> Value {
        Value::Bytes(items.to_vec())
    }
}

macro_rules! impl_array_element {
    ($($ty:ty),* $(,)?) => {
        $(impl ArrayElement for $ty {})*
    };
}

impl_array_element!(
    i8, i16, u16, i32, u32, i64, u64, f32, f64, bool, char, Decimal, String,
    NaiveDateTime, DateTime<FixedOffset>, Duration, Uuid,
);

/// Null items stay absent instead of reading as the element's null value
impl<T: ArrayElement> ArrayElement for Option<T> {}

impl<T: ArrayElement> Field for Vec<T> {
    fn kind() -> ValueKind {
        match T::kind() {
            ValueKind::Scalar(kind) | ValueKind::Array(kind) => ValueKind::Array(kind),
            object => object,
        }
    }

    fn null() -> Self {
        Vec::new()
    }

    fn coerce(value: Value, options: &MapOptions) -> Result<Self> {
        T::from_array(value, options)
    }

    fn to_value(&self) -> Value {
        T::to_array(self)
    }
}

/// Reference to a nested object
///
/// Always starts absent. Nested objects are never read from a single column,
/// so a column matching a `Nested` field is rejected when the accessor binds.
#[derive(Debug, Clone, PartialEq)]
pub struct Nested<T>(pub Option<Box<T>>);

impl<T> Default for Nested<T> {
    fn default() -> Self {
        Nested(None)
    }
}

impl<T: Mapped> Field for Nested<T> {
    fn kind() -> ValueKind {
        ValueKind::Object(type_name::<T>())
    }

    fn null() -> Self {
        Nested(None)
    }

    fn coerce(value: Value, _: &MapOptions) -> Result<Self> {
        Err(Error::conversion(&value, Self::kind()))
    }

    fn to_value(&self) -> Value {
        Value::Null
    }
}

/// An enumeration stored as an open set of integers with named members
///
/// Implemented by [`sql_enum!`](crate::sql_enum).
pub trait SqlEnum: Copy + Send + 'static {
    const NAME: &'static str;
    /// Defined members as (symbolic name, underlying value)
    const MEMBERS: &'static [(&'static str, i64)];

    /// Wraps an underlying value; None if it does not fit the representation
    fn from_raw(raw: i64) -> Option<Self>;

    fn raw(&self) -> i64;

    /// Symbolic name, if the value is a defined member
    fn name(&self) -> Option<&'static str> {
        let raw = self.raw();
        Self::MEMBERS
            .iter()
            .find(|(_, value)| *value == raw)
            .map(|(name, _)| *name)
    }
}

/// Text resolves by exact member name; integers are adopted as the underlying
/// value, checked for membership only under [`EnumMembership::Strict`].
pub fn coerce_enum<E: SqlEnum>(value: Value, options: &MapOptions) -> Result<E> {
    let raw = match value {
        Value::String(name) => {
            return E::MEMBERS
                .iter()
                .find(|(member, _)| *member == name)
                .and_then(|(_, raw)| E::from_raw(*raw))
                .ok_or(Error::UnknownEnumMember {
                    enum_name: E::NAME,
                    value: name,
                });
        }
        ref v => v.as_integer(),
    };
    let raw = raw
        .and_then(|i| i64::try_from(i).ok())
        .ok_or_else(|| Error::conversion(&value, Kind::Enum(E::NAME)))?;

    if !E::MEMBERS.iter().any(|(_, member)| *member == raw) {
        match options.enum_membership {
            EnumMembership::Strict => {
                return Err(Error::EnumOutOfRange {
                    enum_name: E::NAME,
                    value: raw,
                });
            }
            EnumMembership::Lenient => {
                tracing::trace!(enum_name = E::NAME, raw, "adopting undefined enum value");
            }
        }
    }
    E::from_raw(raw).ok_or_else(|| Error::conversion(raw, Kind::Enum(E::NAME)))
}

/// Declares an open enumeration over an integer representation
///
/// ```ignore
/// sql_enum! {
///     pub enum Color: i32 { Red = 1, Green = 2, Blue = 3 }
/// }
/// assert_eq!(Color::Blue.raw(), 3);
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $($member:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name(pub $repr);

        #[allow(non_upper_case_globals)]
        impl $name {
            $(pub const $member: $name = $name($value);)*
        }

        impl $crate::mapping::SqlEnum for $name {
            const NAME: &'static str = stringify!($name);
            const MEMBERS: &'static [(&'static str, i64)] = &[$((stringify!($member), $value as i64)),*];

            fn from_raw(raw: i64) -> Option<Self> {
                <$repr>::try_from(raw).ok().map($name)
            }

            fn raw(&self) -> i64 {
                self.0 as i64
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match $crate::mapping::SqlEnum::name(self) {
                    Some(member) => write!(f, "{}::{}", stringify!($name), member),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }

        impl $crate::mapping::Field for $name {
            fn kind() -> $crate::sql::types::ValueKind {
                $crate::sql::types::ValueKind::Scalar($crate::sql::types::Kind::Enum(stringify!($name)))
            }

            fn null() -> Self {
                $name(0)
            }

            fn coerce(
                value: $crate::sql::types::Value,
                options: &$crate::config::MapOptions,
            ) -> $crate::error::Result<Self> {
                $crate::mapping::coerce_enum(value, options)
            }

            fn to_value(&self) -> $crate::sql::types::Value {
                $crate::sql::types::Value::Int64(self.0 as i64)
            }
        }

        impl $crate::mapping::Mapped for $name {
            fn describe() -> $crate::mapping::TypeDescriptor<Self> {
                $crate::mapping::TypeDescriptor::simple()
            }

            fn from_column(
                value: $crate::sql::types::Value,
                options: &$crate::config::MapOptions,
            ) -> $crate::error::Result<Self> {
                $crate::mapping::read(value, options)
            }
        }
    };
}

macro_rules! impl_simple_mapped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Mapped for $ty {
                fn describe() -> TypeDescriptor<Self> {
                    TypeDescriptor::simple()
                }

                fn from_column(value: Value, options: &MapOptions) -> Result<Self> {
                    read(value, options)
                }
            }
        )*
    };
}

impl_simple_mapped!(
    u8, i8, i16, u16, i32, u32, i64, u64, f32, f64, bool, char, Decimal, String,
    NaiveDateTime, DateTime<FixedOffset>, Duration, Uuid,
);

impl<T: Field> Mapped for Option<T> {
    fn describe() -> TypeDescriptor<Self> {
        TypeDescriptor::simple()
    }

    fn from_column(value: Value, options: &MapOptions) -> Result<Self> {
        read(value, options)
    }
}

impl<T: ArrayElement> Mapped for Vec<T> {
    fn describe() -> TypeDescriptor<Self> {
        TypeDescriptor::simple()
    }

    fn from_column(value: Value, options: &MapOptions) -> Result<Self> {
        read(value, options)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{Field, Nested, SqlEnum, read};
    use crate::{
        config::{EnumMembership, MapOptions},
        error::{Error, Result},
        sql::types::{Kind, Value, ValueKind},
    };

    crate::sql_enum! {
        pub enum Color: i32 { Red = 1, Green = 2, Blue = 3 }
    }

    #[test]
    fn test_null_marker() -> Result<()> {
        let options = MapOptions::default();
        assert_eq!(read::<i32>(Value::Null, &options)?, 0);
        assert_eq!(read::<Option<i32>>(Value::Null, &options)?, None);
        assert_eq!(read::<String>(Value::Null, &options)?, "");
        assert_eq!(read::<Vec<i64>>(Value::Null, &options)?, Vec::<i64>::new());
        assert_eq!(read::<Decimal>(Value::Null, &options)?, Decimal::ZERO);
        assert_eq!(read::<Uuid>(Value::Null, &options)?, Uuid::nil());
        Ok(())
    }

    #[test]
    fn test_numeric_coercion() -> Result<()> {
        let options = MapOptions::default();
        assert_eq!(i32::coerce(Value::Int64(7), &options)?, 7);
        assert_eq!(i64::coerce(Value::from("42"), &options)?, 42);
        assert_eq!(u8::coerce(Value::Float64(3.0), &options)?, 3);
        assert_eq!(f64::coerce(Value::Int32(2), &options)?, 2.0);
        assert_eq!(
            Decimal::coerce(Value::Int64(5), &options)?,
            Decimal::from_str("5").map_err(|e| Error::Internal(e.to_string()))?
        );
        assert!(matches!(
            i16::coerce(Value::Int64(1 << 40), &options),
            Err(Error::Conversion { .. })
        ));
        assert!(matches!(
            i32::coerce(Value::Float64(1.5), &options),
            Err(Error::Conversion { .. })
        ));
        assert!(bool::coerce(Value::Int32(1), &options)?);
        Ok(())
    }

    #[test]
    fn test_boolean_is_not_numeric() -> Result<()> {
        let options = MapOptions::default();
        for value in [Value::Boolean(true), Value::Boolean(false)] {
            assert!(matches!(i32::coerce(value.clone(), &options), Err(Error::Conversion { .. })));
            assert!(matches!(i64::coerce(value.clone(), &options), Err(Error::Conversion { .. })));
            assert!(matches!(f64::coerce(value.clone(), &options), Err(Error::Conversion { .. })));
            assert!(matches!(Decimal::coerce(value.clone(), &options), Err(Error::Conversion { .. })));
            assert!(matches!(char::coerce(value, &options), Err(Error::Conversion { .. })));
        }
        assert!(bool::coerce(Value::Boolean(true), &options)?);
        assert_eq!(String::coerce(Value::Boolean(false), &options)?, "false");
        Ok(())
    }

    #[test]
    fn test_text_coercion() -> Result<()> {
        let options = MapOptions::default();
        assert_eq!(String::coerce(Value::Int32(5), &options)?, "5");
        assert_eq!(char::coerce(Value::from("x"), &options)?, 'x');
        assert!(char::coerce(Value::from("xy"), &options).is_err());

        let dt = NaiveDateTime::coerce(Value::from("2024-03-01 10:30:00"), &options)?;
        assert_eq!(dt.to_string(), "2024-03-01 10:30:00");

        let id = Uuid::new_v4();
        assert_eq!(Uuid::coerce(Value::from(id.to_string()), &options)?, id);
        Ok(())
    }

    #[test]
    fn test_array_coercion() -> Result<()> {
        let options = MapOptions::default();
        assert_eq!(
            Vec::<i32>::coerce(Value::Array(vec![Value::Int32(1), Value::Null]), &options)?,
            vec![1, 0]
        );
        assert_eq!(Vec::<u8>::coerce(Value::Bytes(vec![9, 8]), &options)?, vec![9, 8]);
        assert_eq!(<Vec<u8>>::kind(), ValueKind::Array(Kind::Byte));
        assert_eq!(<Option<Vec<String>>>::kind(), ValueKind::Array(Kind::String));
        assert!(<Option<Vec<String>>>::NULLABLE);
        Ok(())
    }

    #[test]
    fn test_array_of_optional() -> Result<()> {
        let options = MapOptions::default();
        let items = Value::Array(vec![Value::Int32(1), Value::Null, Value::Int64(3)]);
        assert_eq!(
            Vec::<Option<i32>>::coerce(items.clone(), &options)?,
            vec![Some(1), None, Some(3)]
        );
        assert_eq!(read::<Vec<Option<i32>>>(items, &options)?.len(), 3);
        assert_eq!(<Vec<Option<i32>>>::kind(), ValueKind::Array(Kind::Int32));

        let names = vec![Some("a".to_string()), None];
        assert_eq!(
            names.to_value(),
            Value::Array(vec![Value::from("a"), Value::Null])
        );
        assert_eq!(read::<Vec<Option<String>>>(names.to_value(), &options)?, names);
        Ok(())
    }

    #[test]
    fn test_enum_coercion() -> Result<()> {
        let options = MapOptions::default();
        assert_eq!(Color::coerce(Value::from("Blue"), &options)?, Color::Blue);
        assert_eq!(Color::coerce(Value::Int64(2), &options)?, Color::Green);

        let unknown = Color::coerce(Value::Int32(999), &options)?;
        assert_eq!(unknown.raw(), 999);
        assert_eq!(unknown.name(), None);
        assert_eq!(format!("{:?}", unknown), "Color(999)");

        assert_eq!(
            Color::coerce(Value::from("blue"), &options),
            Err(Error::UnknownEnumMember {
                enum_name: "Color",
                value: "blue".to_string()
            })
        );

        let strict = MapOptions {
            enum_membership: EnumMembership::Strict,
            ..MapOptions::default()
        };
        assert_eq!(
            Color::coerce(Value::Int32(999), &strict),
            Err(Error::EnumOutOfRange {
                enum_name: "Color",
                value: 999
            })
        );
        assert!(Color::coerce(Value::Boolean(true), &options).is_err());
        Ok(())
    }

    #[test]
    fn test_nested_has_no_coercion() {
        assert!(matches!(
            <Nested<i32>>::kind(),
            ValueKind::Object(_)
        ));
        assert!(Nested::<i32>::coerce(Value::Int32(1), &MapOptions::default()).is_err());
    }
}
