//! Driver trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use st_core::{AppliedVersions, MigrationFile, PipeWriter, Version};

/// Backend adapter applying migration files to one database.
///
/// A driver starts blank, is connected by [`Driver::initialize`], and is
/// released by [`Driver::close`]. Implementations must be Send + Sync so
/// `migrate` can run on its own task.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Parse `url`, open the connection and create the version table if
    /// it is missing.
    async fn initialize(&self, url: &str) -> DbResult<()>;

    /// Release the connection.
    async fn close(&self) -> DbResult<()>;

    /// Extension of the migration files this driver runs, without a dot.
    fn filename_extension(&self) -> &'static str;

    /// Apply one migration file.
    ///
    /// The file itself must be the first event written to `pipe`. Version
    /// bookkeeping and the file's statements succeed or fail together. Any
    /// failure is reported as an error event. The pipe is always closed
    /// before this returns.
    async fn migrate(&self, file: MigrationFile, pipe: PipeWriter);

    /// Highest applied version, [`Version::NIL`] if none.
    async fn version(&self) -> DbResult<Version>;

    /// Every applied version, descending.
    async fn versions(&self) -> DbResult<AppliedVersions> {
        let current = self.version().await?;
        Ok(AppliedVersions::new([current]))
    }

    /// Driver name for logging
    fn driver_name(&self) -> &'static str;
}
