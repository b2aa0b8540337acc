//! st-core - Core library for Strata
//!
//! This crate provides the versioned migration file model, the ordered file
//! set and its range queries, migration stores, the progress pipe, the
//! interrupt token, and project configuration shared by all Strata crates.

pub mod config;
pub mod direction;
pub mod error;
pub mod file;
pub mod file_set;
pub mod interrupt;
pub mod pipe;
pub mod script;
pub mod store;
pub mod version;

pub use config::Config;
pub use direction::Direction;
pub use error::{CoreError, CoreResult};
pub use file::{
    format_file_name, match_file_name, normalize_name, parse_file_name, MigrationFile,
    MigrationPair, ParsedFileName,
};
pub use file_set::MigrationFileSet;
pub use interrupt::{Interrupt, InterruptMode};
pub use pipe::{pipe, wait_and_redirect, BoxError, PipeEvent, PipeReader, PipeWriter};
pub use store::{FsStore, MemoryStore, MigrationStore};
pub use version::{AppliedVersions, Version};
