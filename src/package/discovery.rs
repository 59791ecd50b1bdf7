use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::identifier::{PackageIdentifier, normalize};
use crate::runtime::Runtime;

/// Directory holding installed packages, relative to the primary root.
pub const ADDON_DIR: &str = "AddonPackages";

/// Extension of package archives.
pub const PACKAGE_EXTENSION: &str = "var";

/// A package archive (or unpacked package directory) found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPackage {
    pub id: PackageIdentifier,
    pub path: PathBuf,
}

/// Find all packages of the primary collection.
///
/// Packages live in `<root>/AddonPackages`; when that directory is absent the
/// root itself is searched.
#[tracing::instrument(skip(runtime, root))]
pub fn find_installed_packages<R: Runtime>(
    runtime: &R,
    root: &Path,
) -> Result<Vec<DiscoveredPackage>> {
    let addon_dir = root.join(ADDON_DIR);
    if runtime.exists(&addon_dir) {
        list_packages(runtime, &addon_dir)
    } else {
        warn!(
            "{} does not exist, searching {:?} directly",
            ADDON_DIR, root
        );
        list_packages(runtime, root)
    }
}

/// Find every `*.var` below `root` and parse its identifier from the file name.
///
/// Files whose names are not `creator.name.version` cannot be referenced by
/// anything and are skipped with a warning.
#[tracing::instrument(skip(runtime, root))]
pub fn list_packages<R: Runtime>(runtime: &R, root: &Path) -> Result<Vec<DiscoveredPackage>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        PACKAGE_EXTENSION
    );
    let files = runtime.glob(&pattern)?;
    debug!("Found {} package file(s) in {:?}", files.len(), root);

    let mut packages = Vec::with_capacity(files.len());
    for path in files {
        match package_identifier(&path) {
            Some(id) => packages.push(DiscoveredPackage { id, path }),
            None => warn!("Skipping {:?}: not a versioned package file name", path),
        }
    }
    Ok(packages)
}

/// Identifier encoded in a package file name, if it carries a concrete version.
pub fn package_identifier(path: &Path) -> Option<PackageIdentifier> {
    let stem = path.file_stem()?.to_str()?;
    match normalize(stem) {
        Ok(id) if !id.is_latest() => Some(id),
        Ok(_) => None,
        Err(e) => {
            debug!("{}", e);
            None
        }
    }
}
