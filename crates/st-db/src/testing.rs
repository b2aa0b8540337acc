//! In-memory driver for tests.
//!
//! A [`MemoryBackend`] owns the "database": the applied versions plus a log
//! of executed files. Every [`MemoryDriver`] made from the same backend
//! shares that state, so a test can open the driver through a registry
//! many times and still observe the effect of earlier operations.

use crate::error::{DbError, DbResult};
use crate::registry::DriverRegistry;
use crate::traits::Driver;
use async_trait::async_trait;
use st_core::{AppliedVersions, Direction, MigrationFile, PipeWriter, Version};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// URL scheme used when a backend registers itself.
pub const MEMORY_SCHEME: &str = "memory";

#[derive(Debug, Default)]
struct State {
    applied: BTreeSet<Version>,
    executed: Vec<String>,
    failing: BTreeSet<(Version, Direction)>,
    delay: Option<Duration>,
    fail_initialize: bool,
    fail_close: bool,
}

/// Shared state behind any number of [`MemoryDriver`]s.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> DbResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn update(&self, f: impl FnOnce(&mut State)) {
        if let Ok(mut state) = self.state() {
            f(&mut state);
        }
    }

    /// Make `migrate` fail for this version and direction.
    pub fn fail_on(&self, version: u64, direction: Direction) {
        self.update(|s| {
            s.failing.insert((Version::new(version), direction));
        });
    }

    pub fn clear_failures(&self) {
        self.update(|s| s.failing.clear());
    }

    /// Make every `migrate` sleep before doing its work.
    pub fn set_delay(&self, delay: Duration) {
        self.update(|s| s.delay = Some(delay));
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.update(|s| s.fail_initialize = fail);
    }

    pub fn fail_close(&self, fail: bool) {
        self.update(|s| s.fail_close = fail);
    }

    /// Seed applied versions directly.
    pub fn set_applied(&self, versions: impl IntoIterator<Item = u64>) {
        self.update(|s| s.applied = versions.into_iter().map(Version::new).collect());
    }

    /// Applied versions, ascending.
    pub fn applied(&self) -> Vec<u64> {
        self.state()
            .map(|s| s.applied.iter().map(|v| v.get()).collect())
            .unwrap_or_default()
    }

    /// Names of files whose statements ran, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state()
            .map(|s| s.executed.clone())
            .unwrap_or_default()
    }

    /// Number of successful `initialize` calls.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of `close` calls on initialized drivers.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// A new blank driver over this backend.
    pub fn driver(&self) -> MemoryDriver {
        MemoryDriver {
            backend: self.clone(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Register this backend under [`MEMORY_SCHEME`].
    pub fn register(&self, registry: &mut DriverRegistry) -> DbResult<()> {
        let backend = self.clone();
        registry.register(MEMORY_SCHEME, move || {
            Box::new(backend.driver()) as Box<dyn Driver>
        })
    }
}

/// Driver over a [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryDriver {
    backend: MemoryBackend,
    initialized: AtomicBool,
}

impl MemoryDriver {
    fn ensure_initialized(&self) -> DbResult<()> {
        if self.initialized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DbError::NotInitialized(MEMORY_SCHEME.to_string()))
        }
    }

    fn apply(&self, file: &MigrationFile) -> DbResult<()> {
        self.ensure_initialized()?;
        file.read_content()
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;

        let mut state = self.backend.state()?;
        if state.failing.contains(&(file.version, file.direction)) {
            return Err(DbError::ExecutionError(format!(
                "{} failed",
                file.file_name
            )));
        }
        if !file.always {
            match file.direction {
                Direction::Up => {
                    if !state.applied.insert(file.version) {
                        return Err(DbError::ExecutionError(format!(
                            "version {} already applied",
                            file.version
                        )));
                    }
                }
                Direction::Down => {
                    state.applied.remove(&file.version);
                }
            }
        }
        state.executed.push(file.file_name.clone());
        Ok(())
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn initialize(&self, url: &str) -> DbResult<()> {
        if self.backend.state()?.fail_initialize {
            return Err(DbError::ConnectionError(format!("cannot reach {url}")));
        }
        self.initialized.store(true, Ordering::SeqCst);
        self.backend.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.backend.closed.fetch_add(1, Ordering::SeqCst);
        if self.backend.state()?.fail_close {
            return Err(DbError::ConnectionError("close failed".to_string()));
        }
        Ok(())
    }

    fn filename_extension(&self) -> &'static str {
        "sql"
    }

    async fn migrate(&self, file: MigrationFile, pipe: PipeWriter) {
        pipe.file(file.clone()).await;
        let delay = self.backend.state().ok().and_then(|s| s.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.apply(&file);
        pipe.close(result.err().map(Into::into)).await;
    }

    async fn version(&self) -> DbResult<Version> {
        Ok(self.versions().await?.current())
    }

    async fn versions(&self) -> DbResult<AppliedVersions> {
        self.ensure_initialized()?;
        Ok(self.backend.state()?.applied.iter().copied().collect())
    }

    fn driver_name(&self) -> &'static str {
        MEMORY_SCHEME
    }
}
