//! Error types for st-migrate

use st_core::CoreError;
use st_db::DbError;
use thiserror::Error;

/// Orchestrator errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// R001: Core error propagation
    #[error("[R001] Core error: {0}")]
    Core(#[from] CoreError),

    /// R002: Driver error propagation
    #[error("[R002] Driver error: {0}")]
    Db(#[from] DbError),

    /// R003: The task running an operation panicked or was cancelled
    #[error("[R003] Migration task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
