//! Up, down, migrate, goto, redo and reset

use anyhow::{Context, Result};
use st_migrate::Operation;
use std::time::Instant;

use crate::cli::GlobalArgs;
use crate::commands::common::{
    build_migrator, listen_for_interrupts, print_elapsed, print_events, resolve_settings,
    ExitCode,
};

/// Run `operation`, printing events as they arrive.
pub(crate) async fn execute(operation: Operation, global: &GlobalArgs) -> Result<()> {
    let settings = resolve_settings(global)?;
    let migrator = build_migrator(&settings, false)?;
    log::debug!(
        "Running {operation} from {}",
        settings.migrations_dir.display()
    );

    let listener = listen_for_interrupts(migrator.interrupt().clone());
    let start_time = Instant::now();

    let (task, events) = migrator.spawn(operation).into_parts();
    let failed = print_events(events).await;
    let joined = task.await;
    listener.abort();
    joined.context("Migration task failed")?;

    print_elapsed(start_time.elapsed());

    if failed {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
