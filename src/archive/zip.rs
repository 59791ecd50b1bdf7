use crate::package::{MANIFEST_FILE, Manifest, PACKAGE_EXTENSION, is_preset_file, preset_references};
use crate::runtime::Runtime;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

use super::{ReferenceReader, merge_references};

/// Reader for packed `.var` archives (zip format)
pub struct ZipReader;

impl ReferenceReader for ZipReader {
    fn can_handle<R: Runtime + 'static>(&self, runtime: &R, package_path: &Path) -> bool {
        let is_package = package_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION) || ext.eq_ignore_ascii_case("zip"));
        is_package && !runtime.is_dir(package_path)
    }

    #[tracing::instrument(skip(self, runtime, package_path))]
    fn read_references<R: Runtime + 'static>(
        &self,
        runtime: &R,
        package_path: &Path,
    ) -> Result<Vec<String>> {
        let file = runtime
            .open(package_path)
            .with_context(|| format!("Failed to open package at {:?}", package_path))?;

        // zip crate requires Read + Seek, but Runtime::open returns Box<dyn Read + Send>
        let mut buffer = Vec::new();
        let mut reader = file;
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read package {:?}", package_path))?;
        let cursor = std::io::Cursor::new(buffer);

        let mut archive = ZipArchive::new(cursor)
            .with_context(|| format!("Failed to parse {:?} as a zip archive", package_path))?;

        let manifest = match archive.by_name(MANIFEST_FILE) {
            Ok(entry) => Manifest::from_reader(entry)
                .with_context(|| format!("Failed to parse {} in {:?}", MANIFEST_FILE, package_path))?,
            Err(ZipError::FileNotFound) => {
                return Err(anyhow!("{} not found in {:?}", MANIFEST_FILE, package_path));
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {} in {:?}", MANIFEST_FILE, package_path));
            }
        };

        let mut preset_refs = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read zip entry {} of {:?}", i, package_path))?;

            if entry.is_dir() || !is_preset_file(entry.name()) {
                continue;
            }

            let name = entry.name().to_string();
            let mut content = String::new();
            if let Err(e) = entry.read_to_string(&mut content) {
                debug!("Skipping preset {} in {:?}: {}", name, package_path, e);
                continue;
            }
            preset_refs.extend(preset_references(&content));
        }

        Ok(merge_references(manifest.references(), preset_refs))
    }
}
