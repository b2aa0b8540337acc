//! st-db - Driver layer for Strata
//!
//! This crate provides the `Driver` trait that applies migration files to a
//! database, the `DriverRegistry` that maps URL schemes to drivers, and the
//! DuckDB implementation. The `test-support` feature adds an in-memory
//! driver for tests.

pub mod duckdb;
pub mod error;
pub mod registry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use duckdb::{DuckDbDriver, DuckDbTarget, DUCKDB_SCHEME};
pub use error::{DbError, DbResult};
pub use registry::{scheme_of, DriverFactory, DriverRegistry};
pub use traits::Driver;
