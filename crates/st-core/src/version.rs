//! Strongly-typed migration versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal identity of a migration, usually a `YYYYMMDDhhmmss` timestamp.
///
/// `Version::NIL` (0) means "no migrations applied".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Sentinel reported when nothing has been applied.
    pub const NIL: Version = Version(0);

    /// Wrap a raw version number.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Return the raw version number.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// True for the nil sentinel.
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }

    /// The next version number, saturating at `u64::MAX`.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl FromStr for Version {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

/// Versions recorded as applied by a driver, highest first.
///
/// Construction normalizes the list: sorted descending, deduplicated, and
/// with the nil sentinel removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppliedVersions(Vec<Version>);

impl AppliedVersions {
    /// An empty applied set.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build from versions in any order.
    pub fn new(versions: impl IntoIterator<Item = Version>) -> Self {
        let mut list: Vec<Version> = versions.into_iter().filter(|v| !v.is_nil()).collect();
        list.sort_unstable_by(|a, b| b.cmp(a));
        list.dedup();
        Self(list)
    }

    /// True if `version` is recorded as applied.
    pub fn contains(&self, version: Version) -> bool {
        // descending order, so search with reversed comparison
        self.0.binary_search_by(|entry| version.cmp(entry)).is_ok()
    }

    /// Highest applied version, or `Version::NIL` when empty.
    pub fn current(&self) -> Version {
        self.0.first().copied().unwrap_or(Version::NIL)
    }

    /// Iterate highest first.
    pub fn iter(&self) -> impl Iterator<Item = Version> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Version] {
        &self.0
    }
}

impl FromIterator<Version> for AppliedVersions {
    fn from_iter<I: IntoIterator<Item = Version>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<u64>> for AppliedVersions {
    fn from(raw: Vec<u64>) -> Self {
        Self::new(raw.into_iter().map(Version::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_version() {
        assert!(Version::NIL.is_nil());
        assert_eq!(Version::default(), Version::NIL);
        assert!(!Version::new(1).is_nil());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!("20240101120000".parse::<Version>().unwrap().get(), 20240101120000);
        assert!("-1".parse::<Version>().is_err());
        assert!("abc".parse::<Version>().is_err());
    }

    #[test]
    fn test_applied_versions_normalized() {
        let applied = AppliedVersions::from(vec![2, 0, 101, 1, 2]);
        assert_eq!(
            applied.as_slice(),
            &[Version::new(101), Version::new(2), Version::new(1)]
        );
        assert_eq!(applied.current(), Version::new(101));
        assert!(applied.contains(Version::new(2)));
        assert!(!applied.contains(Version::new(3)));
        assert!(!applied.contains(Version::NIL));
    }

    #[test]
    fn test_empty_applied_versions() {
        let applied = AppliedVersions::empty();
        assert!(applied.is_empty());
        assert_eq!(applied.current(), Version::NIL);
    }
}
