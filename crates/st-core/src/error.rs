//! Error types for st-core

use crate::direction::Direction;
use crate::version::Version;
use thiserror::Error;

/// Core error type for Strata
#[derive(Error, Debug)]
pub enum CoreError {
    /// S001: File name does not follow `<version>_<name>.<up|down>.<ext>`
    #[error("[S001] Invalid migration file name '{file_name}': expected <version>_<name>.<up|down>.{extension}")]
    InvalidFileName {
        file_name: String,
        extension: String,
    },

    /// S002: Version prefix is not a valid unsigned integer
    #[error("[S002] Invalid migration version '{value}' in '{file_name}'")]
    InvalidVersion { value: String, file_name: String },

    /// S003: Two files claim the same version and direction
    #[error("[S003] Duplicate migration file for version {version} ({direction}): '{first}' and '{second}'")]
    DuplicateMigration {
        version: Version,
        direction: Direction,
        first: String,
        second: String,
    },

    /// S004: A version inside an up range has no up file
    #[error("[S004] Migration version {version} has no up file")]
    MissingUpFile { version: Version },

    /// S005: A version inside a down range has no down file
    #[error("[S005] Migration version {version} has no down file")]
    MissingDownFile { version: Version },

    /// S006: Migration name is empty after normalization
    #[error("[S006] Migration name must not be empty")]
    EmptyMigrationName,

    /// S007: Migration file not present in the store
    #[error("[S007] Migration file not found in {location}: {file_name}")]
    FileNotFound { location: String, file_name: String },

    /// S008: Migrations directory does not exist
    #[error("[S008] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// S009: IO error with file path context
    #[error("[S009] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// S010: Configuration file could not be parsed
    #[error("[S010] Failed to parse config '{path}': {source}")]
    ConfigParseError {
        path: String,
        source: serde_yaml::Error,
    },

    /// S011: Invalid configuration value
    #[error("[S011] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// S012: Store lock poisoned by a panicking writer
    #[error("[S012] Migration store lock poisoned: {0}")]
    StorePoisoned(String),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
