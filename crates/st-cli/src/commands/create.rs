//! Create command implementation

use anyhow::Result;

use crate::cli::{CreateArgs, GlobalArgs};
use crate::commands::common::{build_migrator, resolve_settings};

/// Scaffold an empty up/down pair.
pub(crate) fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let settings = resolve_settings(global)?;
    let migrator = build_migrator(&settings, true)?;
    let pair = migrator.create(&args.name.join(" "))?;

    println!(
        "Version {} migration files created in {}:",
        pair.version,
        settings.migrations_dir.display()
    );
    for file in [pair.up, pair.down].into_iter().flatten() {
        println!("{}", file.file_name);
    }
    Ok(())
}
