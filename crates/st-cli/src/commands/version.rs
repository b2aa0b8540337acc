//! Version and versions commands

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::common::{build_migrator, resolve_settings};

/// Print the highest applied version.
pub(crate) async fn execute_version(global: &GlobalArgs) -> Result<()> {
    let settings = resolve_settings(global)?;
    let migrator = build_migrator(&settings, false)?;
    println!("{}", migrator.version().await?);
    Ok(())
}

/// Print every applied version, highest first.
pub(crate) async fn execute_versions(global: &GlobalArgs) -> Result<()> {
    let settings = resolve_settings(global)?;
    let migrator = build_migrator(&settings, false)?;
    let versions = migrator.versions().await?;
    if versions.is_empty() {
        println!("No migrations applied");
    }
    for version in versions.iter() {
        println!("{version}");
    }
    Ok(())
}
