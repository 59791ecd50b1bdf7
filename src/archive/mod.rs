mod directory;
mod zip;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::path::Path;

pub use directory::DirectoryReader;
pub use zip::ZipReader;

/// Trait for format-specific readers of the references a package declares
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceReader: Send + Sync {
    /// Check if this reader can handle the given package
    fn can_handle<R: Runtime + 'static>(&self, runtime: &R, package_path: &Path) -> bool;

    /// Read the raw dependency references from the package manifest and the
    /// presets bundled with it
    fn read_references<R: Runtime + 'static>(
        &self,
        runtime: &R,
        package_path: &Path,
    ) -> Result<Vec<String>>;
}

/// Dispatcher that selects the appropriate reader based on the package layout.
/// Holds all available readers and dispatches to the correct one.
pub struct PackageReader {
    directory: DirectoryReader,
    zip: ZipReader,
}

impl Default for PackageReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageReader {
    pub fn new() -> Self {
        Self {
            directory: DirectoryReader,
            zip: ZipReader,
        }
    }
}

impl ReferenceReader for PackageReader {
    fn can_handle<R: Runtime + 'static>(&self, runtime: &R, package_path: &Path) -> bool {
        self.directory.can_handle(runtime, package_path) || self.zip.can_handle(runtime, package_path)
    }

    #[tracing::instrument(skip(self, runtime, package_path))]
    fn read_references<R: Runtime + 'static>(
        &self,
        runtime: &R,
        package_path: &Path,
    ) -> Result<Vec<String>> {
        if self.directory.can_handle(runtime, package_path) {
            return self.directory.read_references(runtime, package_path);
        }
        if self.zip.can_handle(runtime, package_path) {
            return self.zip.read_references(runtime, package_path);
        }
        Err(anyhow!(
            "Unsupported package format: {}",
            package_path.display()
        ))
    }
}

/// Manifest references first, then preset references not already listed.
fn merge_references(manifest: Vec<String>, presets: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = manifest.iter().cloned().collect();
    let mut merged = manifest;
    for reference in presets {
        if seen.insert(reference.clone()) {
            merged.push(reference);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn create_test_zip_archive(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        use ::zip::CompressionMethod;
        use ::zip::ZipWriter;
        use ::zip::write::FileOptions;
        use std::io::Write;

        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    #[test]
    fn test_reader_dispatches_to_zip() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("A.Pkg.1.var");
        create_test_zip_archive(
            &archive_path,
            &[("meta.json", r#"{"dependencies":{"B.Thing.1":{}}}"#)],
        )?;

        let reader = PackageReader::new();
        assert!(reader.can_handle(&RealRuntime, &archive_path));
        let refs = reader.read_references(&RealRuntime, &archive_path)?;
        assert_eq!(refs, vec!["B.Thing.1"]);
        Ok(())
    }

    #[test]
    fn test_reader_dispatches_to_directory() -> Result<()> {
        let dir = tempdir()?;
        let package_dir = dir.path().join("A.Pkg.1.var");
        fs::create_dir(&package_dir)?;
        fs::write(
            package_dir.join("meta.json"),
            r#"{"dependencies":{"C.Other.latest":{}}}"#,
        )?;

        let reader = PackageReader::new();
        let refs = reader.read_references(&RealRuntime, &package_dir)?;
        assert_eq!(refs, vec!["C.Other.latest"]);
        Ok(())
    }

    #[test]
    fn test_preset_extension_case_is_ignored_in_both_formats() -> Result<()> {
        let dir = tempdir()?;
        let meta = r#"{"dependencies":{"B.Base.1":{}}}"#;
        let preset = r#"{"url":"C.Skin.2:/Custom/Atom/Person/Textures/a.jpg"}"#;

        let zipped = dir.path().join("A.Zipped.1.var");
        create_test_zip_archive(
            &zipped,
            &[("meta.json", meta), ("Custom/Atom/Person/PRESET_A.VAP", preset)],
        )?;

        let unpacked = dir.path().join("A.Unpacked.1.var");
        fs::create_dir_all(unpacked.join("Custom/Atom/Person"))?;
        fs::write(unpacked.join("meta.json"), meta)?;
        fs::write(unpacked.join("Custom/Atom/Person/PRESET_A.VAP"), preset)?;

        let reader = PackageReader::new();
        let expected = vec!["B.Base.1", "C.Skin.2"];
        assert_eq!(reader.read_references(&RealRuntime, &zipped)?, expected);
        assert_eq!(reader.read_references(&RealRuntime, &unpacked)?, expected);
        Ok(())
    }

    #[test]
    fn test_reader_unsupported_format() {
        let reader = PackageReader::new();
        let result = reader.read_references(&RealRuntime, Path::new("/tmp/file.unknown"));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported package format")
        );
    }

    #[test]
    fn test_merge_references_keeps_order_and_dedupes() {
        let merged = merge_references(
            vec!["B.Two.1".into(), "A.One.1".into()],
            vec!["A.One.1".into(), "C.Three.latest".into()],
        );
        assert_eq!(merged, vec!["B.Two.1", "A.One.1", "C.Three.latest"]);
    }
}
