//! Migration file stores.
//!
//! A store lists migration file names and reads their contents on demand.
//! [`FsStore`] reads a directory on disk; [`MemoryStore`] keeps files in
//! memory for embedded migrations and tests.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Minimal storage abstraction for migration files.
pub trait MigrationStore: Send + Sync {
    /// List the file names available in the store.
    fn list(&self) -> CoreResult<Vec<String>>;

    /// Read the contents of a file.
    fn read(&self, file_name: &str) -> CoreResult<Vec<u8>>;

    /// Write (create or replace) a file.
    fn write(&self, file_name: &str, content: &[u8]) -> CoreResult<()>;

    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// A directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open a store, failing if the directory does not exist.
    pub fn open(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CoreError::MigrationsDirNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }
}

impl MigrationStore for FsStore {
    fn list(&self) -> CoreResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::MigrationsDirNotFound {
                    path: self.root.display().to_string(),
                }
            } else {
                CoreError::IoWithPath {
                    path: self.root.display().to_string(),
                    source: e,
                }
            }
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: self.root.display().to_string(),
                source: e,
            })?;
            if entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, file_name: &str) -> CoreResult<Vec<u8>> {
        let path = self.root.join(file_name);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound {
                    location: self.location(),
                    file_name: file_name.to_string(),
                }
            } else {
                CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })
    }

    fn write(&self, file_name: &str, content: &[u8]) -> CoreResult<()> {
        let path = self.root.join(file_name);
        std::fs::write(&path, content).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// An in-memory store of file name to bytes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(name, content)` pairs.
    pub fn with_files<N, C>(files: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        let files = files
            .into_iter()
            .map(|(name, content)| (name.into(), content.into()))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }
}

impl MigrationStore for MemoryStore {
    fn list(&self) -> CoreResult<Vec<String>> {
        let files = self
            .files
            .read()
            .map_err(|e| CoreError::StorePoisoned(e.to_string()))?;
        Ok(files.keys().cloned().collect())
    }

    fn read(&self, file_name: &str) -> CoreResult<Vec<u8>> {
        let files = self
            .files
            .read()
            .map_err(|e| CoreError::StorePoisoned(e.to_string()))?;
        files
            .get(file_name)
            .cloned()
            .ok_or_else(|| CoreError::FileNotFound {
                location: self.location(),
                file_name: file_name.to_string(),
            })
    }

    fn write(&self, file_name: &str, content: &[u8]) -> CoreResult<()> {
        let mut files = self
            .files
            .write()
            .map_err(|e| CoreError::StorePoisoned(e.to_string()))?;
        files.insert(file_name.to_string(), content.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_lists_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_a.up.sql"), "SELECT 1").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("002_b.up.sql"), "").unwrap();

        let store = FsStore::open(dir.path()).unwrap();
        assert_eq!(store.list().unwrap(), vec!["001_a.up.sql".to_string()]);
        assert_eq!(store.read("001_a.up.sql").unwrap(), b"SELECT 1");
    }

    #[test]
    fn test_fs_store_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            FsStore::open(&missing),
            Err(CoreError::MigrationsDirNotFound { .. })
        ));
        assert!(matches!(
            FsStore::new(&missing).list(),
            Err(CoreError::MigrationsDirNotFound { .. })
        ));
    }

    #[test]
    fn test_fs_store_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        store.write("1_x.up.sql", b"CREATE TABLE x (id INT);").unwrap();
        assert_eq!(store.read("1_x.up.sql").unwrap(), b"CREATE TABLE x (id INT);");
        assert!(matches!(
            store.read("2_y.up.sql"),
            Err(CoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_files([("2_b.up.sql", "b"), ("1_a.up.sql", "a")]);
        assert_eq!(store.list().unwrap(), vec!["1_a.up.sql", "2_b.up.sql"]);
        store.write("3_c.up.sql", b"c").unwrap();
        assert_eq!(store.read("3_c.up.sql").unwrap(), b"c");
        assert!(store.read("missing").is_err());
    }
}
