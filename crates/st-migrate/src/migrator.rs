//! The migration orchestrator.
//!
//! Every operation walks the same states: open the driver, plan the files
//! to run from the store and the applied versions, apply them one at a
//! time, then close the driver and the caller's pipe. Errors never return
//! directly from an operation; they are written to the pipe.

use crate::error::{MigrateError, MigrateResult};
use crate::operation::{MigrationHandle, Operation};
use st_core::{
    pipe, wait_and_redirect, AppliedVersions, BoxError, Interrupt, MigrationFile,
    MigrationFileSet, MigrationStore, PipeWriter, Version,
};
use st_db::{Driver, DriverRegistry};
use std::sync::Arc;

/// Which range of the file set a phase runs.
#[derive(Debug, Clone, Copy)]
enum Selection {
    Pending,
    Applied,
    Relative(i64),
    Goto(Version),
}

/// Runs migrations from one store against one database URL.
///
/// Cloning is cheap; clones share the registry, store and interrupt.
/// Two operations must not run concurrently against the same database.
#[derive(Clone)]
pub struct Migrator {
    registry: Arc<DriverRegistry>,
    url: String,
    store: Arc<dyn MigrationStore>,
    interrupt: Interrupt,
}

impl Migrator {
    pub fn new(
        registry: Arc<DriverRegistry>,
        url: impl Into<String>,
        store: Arc<dyn MigrationStore>,
    ) -> Self {
        Self {
            registry,
            url: url.into(),
            store,
            interrupt: Interrupt::default(),
        }
    }

    /// Use `interrupt` to stop running operations.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn MigrationStore> {
        &self.store
    }

    /// Apply every pending migration.
    pub async fn up(&self, pipe: PipeWriter) {
        self.run(Operation::Up, pipe).await
    }

    /// Revert every applied migration, most recent first.
    pub async fn down(&self, pipe: PipeWriter) {
        self.run(Operation::Down, pipe).await
    }

    /// Move `n` migrations forward or backward.
    pub async fn migrate(&self, n: i64, pipe: PipeWriter) {
        self.run(Operation::Migrate(n), pipe).await
    }

    /// Move to `target`; [`Version::NIL`] reverts everything.
    pub async fn goto(&self, target: Version, pipe: PipeWriter) {
        self.run(Operation::Goto(target), pipe).await
    }

    /// Revert the most recent migration, then apply forward one step.
    pub async fn redo(&self, pipe: PipeWriter) {
        self.run(Operation::Redo, pipe).await
    }

    /// Revert everything, then apply everything.
    pub async fn reset(&self, pipe: PipeWriter) {
        self.run(Operation::Reset, pipe).await
    }

    /// Run `operation`, writing its events to `pipe` and closing it.
    pub async fn run(&self, operation: Operation, pipe: PipeWriter) {
        log::debug!("Starting {operation}");
        let ok = match operation {
            Operation::Up => self.phase(Selection::Pending, &pipe).await,
            Operation::Down => self.phase(Selection::Applied, &pipe).await,
            Operation::Migrate(n) => self.phase(Selection::Relative(n), &pipe).await,
            Operation::Goto(target) => self.phase(Selection::Goto(target), &pipe).await,
            Operation::Redo => {
                self.phase(Selection::Relative(-1), &pipe).await
                    && self.phase(Selection::Relative(1), &pipe).await
            }
            Operation::Reset => {
                self.phase(Selection::Applied, &pipe).await
                    && self.phase(Selection::Pending, &pipe).await
            }
        };
        log::debug!("Finished {operation} (ok: {ok})");
        pipe.close(None).await;
    }

    /// Run `operation` on its own task.
    pub fn spawn(&self, operation: Operation) -> MigrationHandle {
        let (writer, reader) = pipe();
        let migrator = self.clone();
        let task = tokio::spawn(async move { migrator.run(operation, writer).await });
        MigrationHandle::new(task, reader)
    }

    pub async fn up_sync(&self) -> Result<(), Vec<BoxError>> {
        self.spawn(Operation::Up).wait().await
    }

    pub async fn down_sync(&self) -> Result<(), Vec<BoxError>> {
        self.spawn(Operation::Down).wait().await
    }

    pub async fn migrate_sync(&self, n: i64) -> Result<(), Vec<BoxError>> {
        self.spawn(Operation::Migrate(n)).wait().await
    }

    pub async fn goto_sync(&self, target: Version) -> Result<(), Vec<BoxError>> {
        self.spawn(Operation::Goto(target)).wait().await
    }

    pub async fn redo_sync(&self) -> Result<(), Vec<BoxError>> {
        self.spawn(Operation::Redo).wait().await
    }

    pub async fn reset_sync(&self) -> Result<(), Vec<BoxError>> {
        self.spawn(Operation::Reset).wait().await
    }

    /// Highest applied version.
    pub async fn version(&self) -> MigrateResult<Version> {
        Ok(self.versions().await?.current())
    }

    /// Every applied version, descending.
    pub async fn versions(&self) -> MigrateResult<AppliedVersions> {
        let driver = self.registry.open(&self.url).await?;
        let versions = driver.versions().await;
        let closed = driver.close().await;
        let versions = versions?;
        closed?;
        Ok(versions)
    }

    /// One open-plan-apply-close cycle. Returns false on any error or
    /// interrupt.
    async fn phase(&self, selection: Selection, pipe: &PipeWriter) -> bool {
        if self.interrupt.is_requested() {
            return false;
        }

        let driver = match self.registry.open(&self.url).await {
            Ok(driver) => driver,
            Err(e) => {
                pipe.error(MigrateError::from(e)).await;
                return false;
            }
        };

        let ok = match self.plan(driver.as_ref(), selection).await {
            Ok(files) => self.apply(&driver, files, pipe).await,
            Err(e) => {
                pipe.error(e).await;
                false
            }
        };

        match driver.close().await {
            Ok(()) => {
                log::info!("Closed {} driver", driver.driver_name());
                ok
            }
            Err(e) => {
                pipe.error(MigrateError::from(e)).await;
                false
            }
        }
    }

    async fn plan(
        &self,
        driver: &dyn Driver,
        selection: Selection,
    ) -> Result<Vec<MigrationFile>, BoxError> {
        let extension = driver.filename_extension();
        let set = MigrationFileSet::discover(Arc::clone(&self.store), extension)?;
        let applied = driver.versions().await?;
        let files = match selection {
            Selection::Pending => set.pending(&applied)?,
            Selection::Applied => set.applied(&applied)?,
            Selection::Relative(n) => set.relative(n, &applied)?,
            Selection::Goto(target) => set.goto(target, &applied)?,
        };
        log::debug!(
            "Planned {} file(s) for {:?} at version {}",
            files.len(),
            selection,
            applied.current()
        );
        Ok(files)
    }

    /// Dispatch `files` strictly in order, one at a time.
    async fn apply(
        &self,
        driver: &Arc<dyn Driver>,
        files: Vec<MigrationFile>,
        outer: &PipeWriter,
    ) -> bool {
        for file in files {
            if self.interrupt.is_requested() {
                log::warn!("Interrupted before {}", file.file_name);
                return false;
            }
            log::debug!("Dispatching {}", file.file_name);

            let (inner, events) = pipe();
            let task = tokio::spawn({
                let driver = Arc::clone(driver);
                async move { driver.migrate(file, inner).await }
            });

            let ok = wait_and_redirect(events, outer, &self.interrupt).await;
            if self.interrupt.is_forced() {
                task.abort();
                return false;
            }
            if let Err(e) = task.await {
                outer
                    .error(MigrateError::TaskFailed(e.to_string()))
                    .await;
                return false;
            }
            if !ok {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
