//! rowmap - Maps raw SQL result rows into typed values
//!
//! This crate provides:
//! - Bind-parameter scanning and positional parameter binding
//! - Shape classification of destination types (simple, tuple, complex)
//! - Cached per-column-list row plans with lazy, cancellable row mapping
//! - A small executor/session layer to run commands and map their rows

pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod sql;

pub use config::{Config, EnumMembership, MapOptions, ScanOptions};
pub use engine::{AsyncExecutor, Executor, Session};
pub use error::{Error, Result};
pub use mapping::{Classification, Field, Mapped, Mapper, Nested, Registry, SqlEnum};
