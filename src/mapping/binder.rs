//! Binds destination fields to columns and materializes rows
//!
//! Column matching, first hit wins:
//!  1. exact name
//!  2. case-insensitive name
//!  3. case-insensitive name with underscores removed, when enabled
//!
//! Fields with no matching column keep their null value.

use tracing::trace;

use crate::{
    config::MapOptions,
    error::{Error, Result},
    mapping::{FieldDef, Layout, Mapped, Setter, TupleBuilder, TypeDescriptor},
    sql::{
        fold_case,
        types::{Row, ValueKind},
    },
};

/// Resolved accessor for one field: where it reads from and how it is set
pub struct AccessorBinding<T> {
    pub name: &'static str,
    pub ordinal: usize,
    pub kind: ValueKind,
    pub nullable: bool,
    /// Column index, or None when the field stays unmapped
    pub column: Option<usize>,
    /// Another field is bound to the same column
    pub shared: bool,
    pub set: Setter<T>,
}

impl<T> std::fmt::Debug for AccessorBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessorBinding")
            .field("name", &self.name)
            .field("ordinal", &self.ordinal)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("column", &self.column)
            .finish()
    }
}

/// Binds the field at `ordinal` to a column
///
/// A field that matches a column but whose kind has no coercion path is an
/// error, raised here so that no row is ever half-mapped.
pub fn bind<T>(
    type_name: &'static str,
    fields: &[FieldDef<T>],
    ordinal: usize,
    columns: &[String],
    options: &MapOptions,
) -> Result<AccessorBinding<T>> {
    let field = fields.get(ordinal).ok_or_else(|| {
        Error::Internal(format!("{} has no field at ordinal {}", type_name, ordinal))
    })?;
    let column = find_column(columns, field.name, options.match_underscores);

    match (column, field.kind) {
        (Some(index), ValueKind::Object(_)) => {
            return Err(Error::UnsupportedType {
                type_name,
                field: field.name.to_string(),
                kind: format!("{} (column {})", field.kind, columns[index]),
            });
        }
        (None, _) => trace!(type_name, field = field.name, "no column for field, left unmapped"),
        _ => {}
    }

    Ok(AccessorBinding {
        name: field.name,
        ordinal,
        kind: field.kind,
        nullable: field.nullable,
        column,
        shared: false,
        set: field.set,
    })
}

fn find_column(columns: &[String], name: &str, match_underscores: bool) -> Option<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .or_else(|| {
            let name = fold_case(name);
            columns.iter().position(|c| fold_case(c) == name)
        })
        .or_else(|| {
            if !match_underscores {
                return None;
            }
            let name = squash(name);
            columns.iter().position(|c| squash(c) == name)
        })
}

fn squash(name: &str) -> String {
    fold_case(name).chars().filter(|&c| c != '_').collect()
}

enum Strategy<T> {
    Simple,
    Tuple(TupleBuilder<T>),
    Complex {
        bindings: Vec<AccessorBinding<T>>,
        blank: fn() -> T,
    },
}

/// Everything needed to turn a row with one column list into a `T`
pub struct RowPlan<T> {
    type_name: &'static str,
    strategy: Strategy<T>,
}

impl<T: Mapped> RowPlan<T> {
    pub fn build(
        descriptor: &TypeDescriptor<T>,
        columns: &[String],
        options: &MapOptions,
    ) -> Result<Self> {
        let type_name = descriptor.type_name;
        let strategy = match &descriptor.layout {
            Layout::Simple(_) if columns.is_empty() => {
                return Err(Error::Shape(format!(
                    "{} needs one column, the result has none",
                    type_name
                )));
            }
            Layout::Simple(_) => Strategy::Simple,
            Layout::Tuple { slots, build } => {
                descriptor.validate()?;
                if columns.len() < slots.len() {
                    return Err(Error::Shape(format!(
                        "{} needs {} columns, the result has {}",
                        type_name,
                        slots.len(),
                        columns.len()
                    )));
                }
                Strategy::Tuple(*build)
            }
            Layout::Complex { fields, blank } => {
                let mut bindings = (0..fields.len())
                    .map(|ordinal| bind(type_name, fields, ordinal, columns, options))
                    .collect::<Result<Vec<_>>>()?;
                for i in 0..bindings.len() {
                    let Some(column) = bindings[i].column else {
                        continue;
                    };
                    let shared = bindings
                        .iter()
                        .enumerate()
                        .any(|(j, b)| j != i && b.column == Some(column));
                    bindings[i].shared = shared;
                }
                Strategy::Complex {
                    bindings,
                    blank: *blank,
                }
            }
        };
        Ok(Self {
            type_name,
            strategy,
        })
    }

    /// Field bindings, in declaration order; empty for non-complex types
    pub fn bindings(&self) -> &[AccessorBinding<T>] {
        match &self.strategy {
            Strategy::Complex { bindings, .. } => bindings,
            _ => &[],
        }
    }

    pub fn materialize(&self, mut row: Row, options: &MapOptions) -> Result<T> {
        match &self.strategy {
            Strategy::Simple => {
                let value = row.take(0);
                T::from_column(value, options).map_err(|err| self.column_error("0", &row, 0, err))
            }
            Strategy::Tuple(build) => build(&mut row, options),
            Strategy::Complex { bindings, blank } => {
                let mut target = blank();
                for binding in bindings {
                    let Some(index) = binding.column else {
                        continue;
                    };
                    let value = if binding.shared {
                        row.value(index).cloned().unwrap_or_default()
                    } else {
                        row.take(index)
                    };
                    (binding.set)(&mut target, value, options)
                        .map_err(|err| self.column_error(binding.name, &row, index, err))?;
                }
                Ok(target)
            }
        }
    }

    fn column_error(&self, field: &str, row: &Row, index: usize, err: Error) -> Error {
        Error::Column {
            type_name: self.type_name,
            field: field.to_string(),
            column: row.name(index).unwrap_or_default().to_string(),
            source: Box::new(err),
        }
    }
}
