use crate::package::{MANIFEST_FILE, Manifest, preset_pattern, preset_references};
use crate::runtime::Runtime;
use anyhow::Result;
use log::debug;
use std::path::Path;

use super::{ReferenceReader, merge_references};

/// Reader for unpacked packages: a directory named like the archive, holding
/// `meta.json` and the package content.
pub struct DirectoryReader;

impl ReferenceReader for DirectoryReader {
    fn can_handle<R: Runtime + 'static>(&self, runtime: &R, package_path: &Path) -> bool {
        runtime.is_dir(package_path)
    }

    #[tracing::instrument(skip(self, runtime, package_path))]
    fn read_references<R: Runtime + 'static>(
        &self,
        runtime: &R,
        package_path: &Path,
    ) -> Result<Vec<String>> {
        let manifest = Manifest::load(runtime, &package_path.join(MANIFEST_FILE))?;

        let mut preset_refs = Vec::new();
        for preset in runtime.glob(&preset_pattern(package_path))? {
            match runtime.read_to_string(&preset) {
                Ok(content) => preset_refs.extend(preset_references(&content)),
                Err(e) => debug!("Skipping preset {:?}: {}", preset, e),
            }
        }

        Ok(merge_references(manifest.references(), preset_refs))
    }
}
