//! Configuration types and parsing for strata.yml

use crate::error::{CoreError, CoreResult};
use crate::interrupt::InterruptMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names looked up in a project directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["strata.yml", "strata.yaml"];

/// Project configuration from strata.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection URL, e.g. `duckdb://warehouse.duckdb`
    #[serde(default)]
    pub url: Option<String>,

    /// Directory holding migration files, relative to the config file
    #[serde(default = "default_path")]
    pub path: String,

    /// How Ctrl-C is handled while migrating
    #[serde(default)]
    pub interrupt: InterruptMode,
}

fn default_path() -> String {
    "migrations".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            path: default_path(),
            interrupt: InterruptMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    ///
    /// Returns `Ok(None)` when neither strata.yml nor strata.yaml exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Option<Self>> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// Absolute migrations directory for a config loaded from `root`
    pub fn migrations_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "path cannot be empty".to_string(),
            });
        }
        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: "url cannot be empty when set".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
