//! Positional tuples: element i is read from column i

use std::any::type_name;

use crate::{
    config::MapOptions,
    error::{Error, Result},
    mapping::{Layout, Mapped, Slot, TypeDescriptor},
    sql::types::Row,
};

fn read_slot<A: Mapped>(row: &mut Row, index: usize, options: &MapOptions) -> Result<A> {
    let value = row.take(index);
    A::from_column(value, options).map_err(|err| Error::Column {
        type_name: type_name::<A>(),
        field: index.to_string(),
        column: row.name(index).unwrap_or_default().to_string(),
        source: Box::new(err),
    })
}

macro_rules! impl_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: Mapped),+> Mapped for ($($name,)+) {
            fn describe() -> TypeDescriptor<Self> {
                TypeDescriptor {
                    type_name: type_name::<Self>(),
                    layout: Layout::Tuple {
                        slots: vec![$(Slot::of::<$name>()),+],
                        build: |row: &mut Row, options: &MapOptions| {
                            Ok(($(read_slot::<$name>(row, $index, options)?,)+))
                        },
                    },
                }
            }
        }
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13, O: 14);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11, M: 12, N: 13, O: 14, P: 15);
