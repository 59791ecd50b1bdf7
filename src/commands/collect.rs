use anyhow::Result;
use log::{debug, info, warn};
use std::path::Path;

use crate::{
    archive::ReferenceReader,
    graph::Collection,
    package::{PackageIndex, find_installed_packages, find_presets, list_packages},
    runtime::Runtime,
};

/// Everything read from the primary collection.
#[derive(Debug, Default)]
pub struct PrimaryScan {
    pub index: PackageIndex,
    pub collection: Collection,
}

/// Read every package and loose preset of the primary collection.
///
/// A package whose manifest cannot be read still counts as installed; it just
/// declares no references.
#[tracing::instrument(skip(runtime, reader))]
pub fn collect_primary<R: Runtime + 'static, P: ReferenceReader>(
    runtime: &R,
    reader: &P,
    root: &Path,
) -> Result<PrimaryScan> {
    let packages = find_installed_packages(runtime, root)?;
    info!("Found {} package(s) in {:?}", packages.len(), root);

    let mut scan = PrimaryScan::default();
    for package in packages {
        if !scan.index.insert(&package.id, Some(package.path.clone())) {
            continue;
        }
        let references = match reader.read_references(runtime, &package.path) {
            Ok(references) => references,
            Err(e) => {
                warn!("Error reading {:?}: {:#}", package.path, e);
                Vec::new()
            }
        };
        debug!("{} declares {} reference(s)", package.id, references.len());
        scan.collection.add_package(package.id, references);
    }

    let presets = find_presets(runtime, root)?;
    info!("Found {} preset(s)", presets.len());
    for preset in presets {
        scan.collection.add_preset(preset.name, preset.references);
    }

    Ok(scan)
}

/// Index the packages available in a secondary source directory.
#[tracing::instrument(skip(runtime))]
pub fn index_source<R: Runtime>(runtime: &R, source: &Path) -> Result<PackageIndex> {
    let packages = list_packages(runtime, source)?;
    info!("Found {} package(s) in source {:?}", packages.len(), source);
    Ok(PackageIndex::from_entries(
        packages.into_iter().map(|p| (p.id, p.path)),
    ))
}
