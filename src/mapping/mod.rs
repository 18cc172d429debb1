//! Row-to-object mapping
//!
//! A destination type describes its shape once through [`Mapped::describe`].
//! The [`Registry`] caches that description and, per distinct column list,
//! a row plan binding every field to its column. Mapping a result set then
//! costs one plan lookup on the first row and only cached setter calls after.

use std::{any::type_name, sync::Arc};

use futures::Stream;
use tokio_util::sync::CancellationToken;

pub use binder::{AccessorBinding, bind};
pub use field::{ArrayElement, Field, Nested, SqlEnum, assign, coerce_enum, read};
pub use registry::{Registry, Stats};
pub use rows::{MapRows, MapStream};

use crate::{
    config::MapOptions,
    error::{Error, Result},
    sql::types::{Row, Value, ValueKind},
};

mod binder;
mod field;
mod registry;
mod rows;
mod tuple;

/// A type that result rows can be mapped into
///
/// Implemented for atomic types, `Option`, `Vec`, tuples up to 16 elements,
/// enums declared with [`sql_enum!`](crate::sql_enum) and structs declared
/// with [`mapped!`](crate::mapped).
pub trait Mapped: Sized + Send + 'static {
    /// Static shape of the type; run once per registry
    fn describe() -> TypeDescriptor<Self>;

    /// Reads the type from a single column. Only simple types support this.
    fn from_column(value: Value, options: &MapOptions) -> Result<Self> {
        let _ = (value, options);
        Err(Error::Shape(format!(
            "{} cannot be read from a single column",
            type_name::<Self>()
        )))
    }
}

/// How a destination type is populated from a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Read from the first column
    Simple,
    /// Element i read from column i
    PositionalTuple,
    /// Fields matched to columns by name
    Complex,
}

pub type Setter<T> = fn(&mut T, Value, &MapOptions) -> Result<()>;
pub type TupleBuilder<T> = fn(&mut Row, &MapOptions) -> Result<T>;

/// Cached description of a destination type
pub struct TypeDescriptor<T> {
    pub type_name: &'static str,
    pub layout: Layout<T>,
}

pub enum Layout<T> {
    Simple(ValueKind),
    Tuple {
        slots: Vec<Slot>,
        build: TupleBuilder<T>,
    },
    Complex {
        fields: Vec<FieldDef<T>>,
        /// Instance with every field at its null value
        blank: fn() -> T,
    },
}

impl<T: Field> TypeDescriptor<T> {
    pub fn simple() -> Self {
        Self {
            type_name: type_name::<T>(),
            layout: Layout::Simple(T::kind()),
        }
    }
}

impl<T> TypeDescriptor<T> {
    pub fn complex(fields: Vec<FieldDef<T>>, blank: fn() -> T) -> Self {
        Self {
            type_name: type_name::<T>(),
            layout: Layout::Complex { fields, blank },
        }
    }

    pub fn classification(&self) -> Classification {
        match self.layout {
            Layout::Simple(_) => Classification::Simple,
            Layout::Tuple { .. } => Classification::PositionalTuple,
            Layout::Complex { .. } => Classification::Complex,
        }
    }

    /// Rejects shapes that no column list can satisfy
    pub fn validate(&self) -> Result<()> {
        if let Layout::Tuple { slots, .. } = &self.layout {
            if let Some((i, slot)) = slots
                .iter()
                .enumerate()
                .find(|(_, slot)| slot.classification != Classification::Simple)
            {
                return Err(Error::Shape(format!(
                    "element {} of {} is {}, tuples take simple elements only",
                    i, self.type_name, slot.type_name
                )));
            }
        }
        Ok(())
    }
}

/// One tuple element
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub type_name: &'static str,
    pub classification: Classification,
}

impl Slot {
    pub fn of<T: Mapped>() -> Self {
        let descriptor = T::describe();
        Self {
            type_name: descriptor.type_name,
            classification: descriptor.classification(),
        }
    }
}

/// One settable field of a complex type, in declaration order
pub struct FieldDef<T> {
    pub name: &'static str,
    pub kind: ValueKind,
    pub nullable: bool,
    pub set: Setter<T>,
}

impl<T> FieldDef<T> {
    pub fn new<F: Field>(name: &'static str, set: Setter<T>) -> Self {
        Self {
            name: name.trim_start_matches("r#"),
            kind: F::kind(),
            nullable: F::NULLABLE,
            set,
        }
    }
}

/// Declares a struct whose rows map by column name
///
/// Every field type must implement [`Field`]. The struct also gets a
/// [`ToParameters`](crate::sql::params::ToParameters) impl, so it can be
/// passed as a parameter object.
///
/// ```ignore
/// mapped! {
///     #[derive(Debug)]
///     pub struct Customer {
///         pub id: i32,
///         pub name: Option<String>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! mapped {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$field_meta])* $field_vis $field: $ty),*
        }

        impl $crate::mapping::Mapped for $name {
            fn describe() -> $crate::mapping::TypeDescriptor<Self> {
                $crate::mapping::TypeDescriptor::complex(
                    vec![$(
                        $crate::mapping::FieldDef::new::<$ty>(
                            stringify!($field),
                            |target: &mut $name,
                             value: $crate::sql::types::Value,
                             options: &$crate::config::MapOptions| {
                                $crate::mapping::assign(&mut target.$field, value, options)
                            },
                        )
                    ),*],
                    || $name {
                        $($field: <$ty as $crate::mapping::Field>::null()),*
                    },
                )
            }
        }

        impl $crate::sql::params::ToParameters for $name {
            fn to_parameters(&self) -> Vec<(&'static str, $crate::sql::types::Value)> {
                let mut params = Vec::new();
                $(
                    if !matches!(
                        <$ty as $crate::mapping::Field>::kind(),
                        $crate::sql::types::ValueKind::Object(_)
                    ) {
                        params.push((
                            stringify!($field).trim_start_matches("r#"),
                            $crate::mapping::Field::to_value(&self.$field),
                        ));
                    }
                )*
                params
            }
        }
    };
}

/// Entry point for mapping raw rows into typed values
#[derive(Clone)]
pub struct Mapper {
    registry: Arc<Registry>,
    options: MapOptions,
    cancel: Option<CancellationToken>,
}

impl Mapper {
    pub fn new(registry: Arc<Registry>, options: MapOptions) -> Self {
        Self {
            registry,
            options,
            cancel: None,
        }
    }

    /// Mapper over the process-wide registry with default options
    pub fn global() -> Self {
        Self::new(Registry::global(), MapOptions::default())
    }

    /// Stops mapping between rows once the token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn classify<T: Mapped>(&self) -> Result<Classification> {
        self.registry.classify::<T>()
    }

    /// Lazily maps a row sequence. Shape errors that do not depend on the
    /// column list are raised here, before any row is read.
    pub fn map<T, I>(&self, rows: I) -> Result<MapRows<T, I::IntoIter>>
    where
        T: Mapped,
        I: IntoIterator<Item = Result<Row>>,
    {
        self.registry.descriptor::<T>()?.validate()?;
        Ok(MapRows::new(rows.into_iter(), self.cursor()))
    }

    pub fn map_stream<T, S>(&self, rows: S) -> Result<MapStream<T, S>>
    where
        T: Mapped,
        S: Stream<Item = Result<Row>> + Unpin,
    {
        self.registry.descriptor::<T>()?.validate()?;
        Ok(MapStream::new(rows, self.cursor()))
    }

    fn cursor<T: Mapped>(&self) -> rows::Cursor<T> {
        rows::Cursor::new(
            self.registry.clone(),
            self.options.clone(),
            self.cancel.clone(),
        )
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::global()
    }
}
