//! Runtime options for scanning and mapping
//!
//! All options deserialize with defaults, so a partial document such as
//! `{ "mapping": { "enum_membership": "Strict" } }` is a valid config.

use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanOptions,
    pub mapping: MapOptions,
}

/// Parameter scanner options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Bind-marker character; doubled, it denotes a driver system reference
    pub marker: char,
    /// Keyword that introduces a script-local variable
    pub declare_keyword: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            marker: '@',
            declare_keyword: "declare".to_string(),
        }
    }
}

/// How integers are turned into enum values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumMembership {
    /// Any integer is adopted as the underlying value, defined or not
    #[default]
    Lenient,
    /// Integers must equal a defined member's value
    Strict,
}

/// Row mapper options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub enum_membership: EnumMembership,
    /// Ignore underscores when matching column names to field names
    pub match_underscores: bool,
}
