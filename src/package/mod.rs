//! Package model
//!
//! This module provides package identifiers, the index of available
//! versions, and discovery of packages, manifests and presets on disk.

mod discovery;
mod identifier;
mod index;
mod manifest;
mod preset;

pub use discovery::{
    ADDON_DIR, DiscoveredPackage, PACKAGE_EXTENSION, find_installed_packages, list_packages,
    package_identifier,
};
pub use identifier::{
    LATEST, PackageIdentifier, PackageKey, ParseError, Version, VersionNumber, normalize,
};
pub use index::PackageIndex;
pub use manifest::{MANIFEST_FILE, Manifest};
pub use preset::{
    PRESET_DIR, Preset, find_presets, is_preset_file, preset_pattern, preset_references,
};
