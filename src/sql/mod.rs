//! SQL-facing data
//!
//! This module provides:
//! - `params`: parameter scanning, binding and command descriptions
//! - `types`: runtime values and raw rows

pub mod params;
pub mod types;

/// Case folding used for every name comparison: parameter names, bound names
/// and column names
pub(crate) fn fold_case(name: &str) -> String {
    name.to_lowercase()
}
