//! Lookup of available package versions by creator and name.

use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::identifier::{PackageIdentifier, PackageKey, Version, VersionNumber};

/// Versions available for every `(creator, name)` found in one directory scan.
///
/// Built once and read-only afterwards. Each version may remember the file
/// it was found at, which is what a copy plan points to.
#[derive(Debug, Default, Clone)]
pub struct PackageIndex {
    packages: HashMap<PackageKey, BTreeMap<VersionNumber, Option<PathBuf>>>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from bare identifiers.
    pub fn build(identifiers: impl IntoIterator<Item = PackageIdentifier>) -> Self {
        let mut index = Self::new();
        for id in identifiers {
            index.insert(&id, None);
        }
        index
    }

    /// Build an index from identifiers paired with the file they were found at.
    pub fn from_entries(entries: impl IntoIterator<Item = (PackageIdentifier, PathBuf)>) -> Self {
        let mut index = Self::new();
        for (id, path) in entries {
            index.insert(&id, Some(path));
        }
        index
    }

    /// Add one available package. Returns false if it was already present or
    /// carries no concrete version.
    ///
    /// The first location recorded for a version is kept.
    pub fn insert(&mut self, id: &PackageIdentifier, location: Option<PathBuf>) -> bool {
        let Version::Number(version) = &id.version else {
            debug!("Ignoring {} as an available package: no concrete version", id);
            return false;
        };

        let versions = self.packages.entry(id.key()).or_default();
        if versions.contains_key(version) {
            debug!("Duplicate package {} at {:?}", id, location);
            return false;
        }
        versions.insert(version.clone(), location);
        true
    }

    pub fn lookup_exact(&self, creator: &str, name: &str, version: &VersionNumber) -> bool {
        self.versions(creator, name)
            .is_some_and(|versions| versions.contains_key(version))
    }

    pub fn lookup_highest(&self, creator: &str, name: &str) -> Option<&VersionNumber> {
        self.versions(creator, name)
            .and_then(|versions| versions.last_key_value())
            .map(|(version, _)| version)
    }

    /// Whether this exact, concrete identifier is available.
    pub fn contains(&self, id: &PackageIdentifier) -> bool {
        match &id.version {
            Version::Number(version) => self.lookup_exact(&id.creator, &id.name, version),
            Version::Latest => false,
        }
    }

    /// File the package was found at, if the index was built with locations.
    pub fn location(&self, id: &PackageIdentifier) -> Option<&Path> {
        let Version::Number(version) = &id.version else {
            return None;
        };
        self.versions(&id.creator, &id.name)?
            .get(version)?
            .as_deref()
    }

    /// Number of distinct available identifiers.
    pub fn len(&self) -> usize {
        self.packages.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn versions(&self, creator: &str, name: &str) -> Option<&BTreeMap<VersionNumber, Option<PathBuf>>> {
        self.packages.get(&PackageKey {
            creator: creator.to_string(),
            name: name.to_string(),
        })
    }
}
