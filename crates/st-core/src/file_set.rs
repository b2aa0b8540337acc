//! Ordered migration file sets and range queries.
//!
//! A [`MigrationFileSet`] is built once per operation from a store listing.
//! Pairs are strictly increasing by version with no duplicates. Range
//! queries return individual files in the order they must execute.

use crate::direction::Direction;
use crate::error::{CoreError, CoreResult};
use crate::file::{match_file_name, MigrationFile, MigrationPair};
use crate::store::MigrationStore;
use crate::version::{AppliedVersions, Version};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered, deduplicated collection of migration pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationFileSet {
    pairs: Vec<MigrationPair>,
}

impl MigrationFileSet {
    /// Scan `store` for files matching the grammar for `extension`.
    ///
    /// Names that don't match are skipped, as are names whose version does
    /// not fit in a `u64`. Two files with the same version and direction
    /// fail discovery.
    pub fn discover(store: Arc<dyn MigrationStore>, extension: &str) -> CoreResult<Self> {
        let mut files = Vec::new();
        for file_name in store.list()? {
            match match_file_name(&file_name, extension) {
                Ok(Some(parsed)) => {
                    files.push(MigrationFile::from_store(parsed, file_name, Arc::clone(&store)))
                }
                Ok(None) => {}
                Err(e @ CoreError::InvalidVersion { .. }) => {
                    log::warn!("Skipping {file_name}: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        let set = Self::from_files(files)?;
        log::debug!(
            "Discovered {} migration versions in {}",
            set.len(),
            store.location()
        );
        Ok(set)
    }

    /// Assemble pairs from individual files.
    pub fn from_files(files: impl IntoIterator<Item = MigrationFile>) -> CoreResult<Self> {
        let mut by_version: BTreeMap<Version, MigrationPair> = BTreeMap::new();

        for file in files {
            let pair = by_version
                .entry(file.version)
                .or_insert_with(|| MigrationPair::new(file.version));
            let slot = match file.direction {
                Direction::Up => &mut pair.up,
                Direction::Down => &mut pair.down,
            };
            if let Some(existing) = slot {
                return Err(CoreError::DuplicateMigration {
                    version: file.version,
                    direction: file.direction,
                    first: existing.file_name.clone(),
                    second: file.file_name,
                });
            }
            *slot = Some(file);
        }

        Ok(Self {
            pairs: by_version.into_values().collect(),
        })
    }

    /// All pairs, ascending by version.
    pub fn pairs(&self) -> &[MigrationPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Highest version in the set.
    pub fn latest_version(&self) -> Option<Version> {
        self.pairs.last().map(|p| p.version)
    }

    /// Look up the pair for `version`.
    pub fn get(&self, version: Version) -> Option<&MigrationPair> {
        self.pairs
            .binary_search_by(|p| p.version.cmp(&version))
            .ok()
            .map(|idx| &self.pairs[idx])
    }

    /// Pairs not recorded as applied, ascending.
    fn pending_pairs<'a>(
        &'a self,
        applied: &'a AppliedVersions,
    ) -> impl Iterator<Item = &'a MigrationPair> + 'a {
        self.pairs.iter().filter(move |p| !applied.contains(p.version))
    }

    fn up_file(pair: &MigrationPair) -> CoreResult<MigrationFile> {
        pair.up.clone().ok_or(CoreError::MissingUpFile {
            version: pair.version,
        })
    }

    fn down_file(&self, version: Version) -> CoreResult<MigrationFile> {
        self.get(version)
            .and_then(|p| p.down.clone())
            .ok_or(CoreError::MissingDownFile { version })
    }

    /// Every up file not yet applied, ascending.
    pub fn pending(&self, applied: &AppliedVersions) -> CoreResult<Vec<MigrationFile>> {
        self.pending_pairs(applied).map(Self::up_file).collect()
    }

    /// Every down file of an applied version, most recent first.
    pub fn applied(&self, applied: &AppliedVersions) -> CoreResult<Vec<MigrationFile>> {
        applied.iter().map(|v| self.down_file(v)).collect()
    }

    /// Files to move `n` steps from the current state.
    ///
    /// Positive `n` takes up to `n` pending up files from the lowest pending
    /// version; negative `n` takes the down files of the `|n|` highest
    /// applied versions, highest first. Fewer candidates than requested is
    /// not an error.
    pub fn relative(&self, n: i64, applied: &AppliedVersions) -> CoreResult<Vec<MigrationFile>> {
        let count = n.unsigned_abs() as usize;
        match n {
            0 => Ok(Vec::new()),
            n if n > 0 => self
                .pending_pairs(applied)
                .take(count)
                .map(Self::up_file)
                .collect(),
            _ => applied
                .iter()
                .take(count)
                .map(|v| self.down_file(v))
                .collect(),
        }
    }

    /// Number of relative steps needed to reach `target`.
    ///
    /// Moving backward counts the applied versions above `target`; moving
    /// forward counts the pending versions at or below it.
    pub fn steps_to(&self, target: Version, applied: &AppliedVersions) -> i64 {
        let current = applied.current();
        if target < current {
            let back = applied.iter().filter(|v| *v > target).count();
            -(back as i64)
        } else {
            self.pending_pairs(applied)
                .filter(|p| p.version <= target)
                .count() as i64
        }
    }

    /// Files to move from the current state to `target`.
    pub fn goto(
        &self,
        target: Version,
        applied: &AppliedVersions,
    ) -> CoreResult<Vec<MigrationFile>> {
        self.relative(self.steps_to(target, applied), applied)
    }
}

#[cfg(test)]
#[path = "file_set_test.rs"]
mod tests;
