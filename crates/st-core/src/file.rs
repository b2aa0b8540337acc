//! Migration files and the on-disk naming grammar.
//!
//! Every migration file is named `<version>_<name>.<up|down>.<extension>`,
//! where the extension is supplied by the driver. Content is not loaded at
//! discovery time; [`MigrationFile::read_content`] fetches it from the store
//! that listed the file.

use crate::direction::Direction;
use crate::error::{CoreError, CoreResult};
use crate::store::MigrationStore;
use crate::version::Version;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

static FILE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn file_name_regex() -> &'static Regex {
    FILE_NAME_RE
        .get_or_init(|| Regex::new(r"^(\d+)_(.+)\.(up|down)\.(.+)$").expect("valid regex"))
}

/// Components parsed out of a migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub version: Version,
    pub name: String,
    pub direction: Direction,
}

/// Strictly parse `file_name` against the grammar for `extension`.
///
/// Returns an error for any name that does not match; directory discovery
/// uses [`match_file_name`] instead, which skips non-matches.
pub fn parse_file_name(file_name: &str, extension: &str) -> CoreResult<ParsedFileName> {
    match_file_name(file_name, extension)?.ok_or_else(|| CoreError::InvalidFileName {
        file_name: file_name.to_string(),
        extension: extension.to_string(),
    })
}

/// Parse `file_name` if it follows the grammar, `Ok(None)` if it does not.
///
/// A name that matches but whose version overflows `u64` is an error.
pub fn match_file_name(file_name: &str, extension: &str) -> CoreResult<Option<ParsedFileName>> {
    let Some(caps) = file_name_regex().captures(file_name) else {
        return Ok(None);
    };
    if &caps[4] != extension {
        return Ok(None);
    }

    let version = caps[1]
        .parse::<Version>()
        .map_err(|_| CoreError::InvalidVersion {
            value: caps[1].to_string(),
            file_name: file_name.to_string(),
        })?;
    let direction = match &caps[3] {
        "up" => Direction::Up,
        _ => Direction::Down,
    };

    Ok(Some(ParsedFileName {
        version,
        name: caps[2].to_string(),
        direction,
    }))
}

/// Replace spaces with underscores, trimming surrounding whitespace.
pub fn normalize_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Render a file name following the grammar.
pub fn format_file_name(
    version: Version,
    name: &str,
    direction: Direction,
    extension: &str,
) -> String {
    format!("{}_{}.{}.{}", version, name, direction, extension)
}

#[derive(Clone)]
enum ContentSource {
    Store(Arc<dyn MigrationStore>),
    Inline(Arc<[u8]>),
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Store(store) => write!(f, "Store({})", store.location()),
            ContentSource::Inline(bytes) => write!(f, "Inline({} bytes)", bytes.len()),
        }
    }
}

/// One physical migration script: one direction of one version.
#[derive(Debug, Clone)]
pub struct MigrationFile {
    /// Version this file belongs to
    pub version: Version,
    /// Human label, spaces replaced with underscores
    pub name: String,
    /// Up or down
    pub direction: Direction,
    /// File name in the store
    pub file_name: String,
    /// Re-run regardless of applied state; drivers skip version bookkeeping
    pub always: bool,
    source: ContentSource,
}

impl MigrationFile {
    /// A file discovered in `store` under `file_name`.
    pub fn from_store(
        parsed: ParsedFileName,
        file_name: impl Into<String>,
        store: Arc<dyn MigrationStore>,
    ) -> Self {
        Self {
            version: parsed.version,
            name: parsed.name,
            direction: parsed.direction,
            file_name: file_name.into(),
            always: false,
            source: ContentSource::Store(store),
        }
    }

    /// A file with inline content, not backed by any store.
    pub fn inline(
        version: Version,
        name: &str,
        direction: Direction,
        extension: &str,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let name = normalize_name(name);
        Self {
            version,
            file_name: format_file_name(version, &name, direction, extension),
            name,
            direction,
            always: false,
            source: ContentSource::Inline(Arc::from(content.into())),
        }
    }

    /// Mark the file as always re-run.
    pub fn with_always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    /// Load the file's content.
    pub fn read_content(&self) -> CoreResult<Vec<u8>> {
        match &self.source {
            ContentSource::Store(store) => store.read(&self.file_name),
            ContentSource::Inline(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl PartialEq for MigrationFile {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.direction == other.direction
            && self.file_name == other.file_name
            && self.always == other.always
    }
}

impl Eq for MigrationFile {}

impl fmt::Display for MigrationFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// The up and down files of one version. Either side may be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPair {
    pub version: Version,
    pub up: Option<MigrationFile>,
    pub down: Option<MigrationFile>,
}

impl MigrationPair {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            up: None,
            down: None,
        }
    }

    /// The file for `direction`, if present.
    pub fn file(&self, direction: Direction) -> Option<&MigrationFile> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
