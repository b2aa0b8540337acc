//! Scaffolding of new migration pairs.

use crate::error::MigrateResult;
use crate::migrator::Migrator;
use chrono::{DateTime, Utc};
use st_core::{
    format_file_name, normalize_name, CoreError, Direction, MigrationFile, MigrationFileSet,
    MigrationPair, ParsedFileName, Version,
};
use std::sync::Arc;

/// Version for a migration created at `now`: `YYYYMMDDhhmmss` in UTC.
pub fn timestamp_version(now: DateTime<Utc>) -> MigrateResult<Version> {
    let stamp = now.format("%Y%m%d%H%M%S").to_string();
    let version = stamp.parse::<Version>().map_err(|_| CoreError::InvalidVersion {
        value: stamp.clone(),
        file_name: "<timestamp>".to_string(),
    })?;
    Ok(version)
}

impl Migrator {
    /// Create an empty up/down pair named `name`, versioned by the current
    /// time.
    pub fn create(&self, name: &str) -> MigrateResult<MigrationPair> {
        self.create_at(name, Utc::now())
    }

    /// Create an empty up/down pair as if the current time were `now`.
    ///
    /// The driver is only instantiated to learn its file extension; no
    /// connection is made. If the store already holds a version at or
    /// above the timestamp, the new pair gets the latest version plus one.
    pub fn create_at(&self, name: &str, now: DateTime<Utc>) -> MigrateResult<MigrationPair> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(CoreError::EmptyMigrationName.into());
        }

        let extension = self.registry().instantiate(self.url())?.filename_extension();
        let set = MigrationFileSet::discover(Arc::clone(self.store()), extension)?;

        let mut version = timestamp_version(now)?;
        if let Some(latest) = set.latest_version() {
            if latest >= version {
                version = latest.next();
            }
        }

        let mut pair = MigrationPair::new(version);
        for direction in [Direction::Up, Direction::Down] {
            let file_name = format_file_name(version, &name, direction, extension);
            self.store().write(&file_name, b"")?;
            let parsed = ParsedFileName {
                version,
                name: name.clone(),
                direction,
            };
            let file = MigrationFile::from_store(parsed, file_name, Arc::clone(self.store()));
            match direction {
                Direction::Up => pair.up = Some(file),
                Direction::Down => pair.down = Some(file),
            }
        }

        log::info!(
            "Created migration {} in {}",
            version,
            self.store().location()
        );
        Ok(pair)
    }
}

#[cfg(test)]
#[path = "create_test.rs"]
mod tests;
