//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use console::style;
use st_core::{
    Config, Direction, FsStore, Interrupt, InterruptMode, MigrationStore, PipeEvent, PipeReader,
};
use st_db::DriverRegistry;
use st_migrate::Migrator;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main exits with the code without printing.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Settings resolved from flags, environment and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) url: Option<String>,
    pub(crate) migrations_dir: PathBuf,
    pub(crate) interrupt: InterruptMode,
}

impl Settings {
    /// The database URL, or an error naming every place it can come from.
    pub(crate) fn require_url(&self) -> Result<&str> {
        match self.url.as_deref() {
            Some(url) => Ok(url),
            None => {
                bail!("No database URL: pass --url, set MIGRATE_URL, or add `url` to strata.yml")
            }
        }
    }
}

/// Resolve settings relative to the current directory.
pub(crate) fn resolve_settings(global: &GlobalArgs) -> Result<Settings> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    resolve_settings_in(global, &cwd)
}

/// Resolve settings: flag (or MIGRATE_URL) > config file > default.
pub(crate) fn resolve_settings_in(global: &GlobalArgs, cwd: &Path) -> Result<Settings> {
    let (config, root) = match &global.config {
        Some(path) => {
            let path = cwd.join(path);
            let config = Config::load(&path)?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            (config, root)
        }
        None => (Config::load_from_dir(cwd)?.unwrap_or_default(), cwd.to_path_buf()),
    };

    let migrations_dir = match &global.path {
        Some(path) => cwd.join(path),
        None => config.migrations_dir(&root),
    };
    let interrupt = if global.non_graceful {
        InterruptMode::Immediate
    } else {
        config.interrupt
    };

    Ok(Settings {
        url: global.url.clone().or(config.url),
        migrations_dir,
        interrupt,
    })
}

/// Build a migrator over the configured directory and URL.
///
/// With `create_dir`, a missing migrations directory is created instead of
/// reported.
pub(crate) fn build_migrator(settings: &Settings, create_dir: bool) -> Result<Migrator> {
    let url = settings.require_url()?;
    if create_dir {
        std::fs::create_dir_all(&settings.migrations_dir).with_context(|| {
            format!("Failed to create {}", settings.migrations_dir.display())
        })?;
    }
    let store: Arc<dyn MigrationStore> = Arc::new(FsStore::open(&settings.migrations_dir)?);
    let registry = Arc::new(DriverRegistry::with_defaults());
    Ok(Migrator::new(registry, url, store).with_interrupt(Interrupt::new(settings.interrupt)))
}

/// Forward every Ctrl-C to `interrupt` until aborted.
pub(crate) fn listen_for_interrupts(interrupt: Interrupt) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let count = interrupt.signal();
            log::debug!("Received interrupt #{count}");
        }
    })
}

/// Render one event as a terminal line.
pub(crate) fn format_event(event: &PipeEvent) -> String {
    match event {
        PipeEvent::File(file) => match file.direction {
            Direction::Up => format!("{} {}", style(">").green(), file.file_name),
            Direction::Down => format!("{} {}", style("<").red(), file.file_name),
        },
        PipeEvent::Message(message) => message.clone(),
        PipeEvent::Error(err) => style(err.to_string()).red().to_string(),
    }
}

/// Print every event until the pipe closes. Returns true if any error
/// event was seen.
pub(crate) async fn print_events(mut reader: PipeReader) -> bool {
    let mut failed = false;
    while let Some(event) = reader.recv().await {
        let line = format_event(&event);
        if event.is_error() {
            failed = true;
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
    failed
}

pub(crate) fn print_elapsed(elapsed: Duration) {
    println!("\n{:.4} seconds", elapsed.as_secs_f64());
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
