//! Drivers command implementation

use anyhow::Result;
use st_db::DriverRegistry;

/// List registered driver schemes.
pub(crate) fn execute() -> Result<()> {
    for scheme in DriverRegistry::with_defaults().drivers() {
        println!("{scheme}");
    }
    Ok(())
}
