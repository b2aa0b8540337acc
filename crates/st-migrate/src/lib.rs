//! st-migrate - Migration orchestrator for Strata
//!
//! A [`Migrator`] plans which migration files to run from a store and the
//! database's applied versions, applies them one at a time through a
//! driver, and reports progress on a pipe.

pub mod create;
pub mod error;
pub mod migrator;
pub mod operation;

pub use create::timestamp_version;
pub use error::{MigrateError, MigrateResult};
pub use migrator::Migrator;
pub use operation::{MigrationHandle, Operation};
