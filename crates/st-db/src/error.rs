//! Error types for st-db

use thiserror::Error;

/// Driver and registry errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Malformed connection URL (D003)
    #[error("[D003] Invalid database URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No driver registered for the URL scheme (D004)
    #[error("[D004] Driver '{scheme}' not found (available: {available})")]
    UnknownDriver { scheme: String, available: String },

    /// Scheme registered twice (D005)
    #[error("[D005] Driver '{0}' is already registered")]
    DuplicateDriver(String),

    /// Driver reports an unusable filename extension (D006)
    #[error("[D006] Driver '{scheme}' returned invalid filename extension '{extension}': must be non-empty and must not start with a dot")]
    InvalidExtension { scheme: String, extension: String },

    /// Mutex poisoned (D007)
    #[error("[D007] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Driver used before initialize (D008)
    #[error("[D008] Driver '{0}' is not initialized")]
    NotInitialized(String),

    /// Internal error (D009)
    #[error("[D009] Internal database error: {0}")]
    Internal(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
