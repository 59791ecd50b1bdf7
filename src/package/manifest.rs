use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::runtime::Runtime;

/// File name of the manifest at the root of every package.
pub const MANIFEST_FILE: &str = "meta.json";

/// The part of a package manifest this tool cares about.
///
/// Only the keys of `dependencies` are used; their values (nested
/// dependency trees, licence info) are kept opaque.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: Option<Map<String, Value>>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid package manifest")
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        serde_json::from_reader(reader).context("Invalid package manifest")
    }

    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::parse(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Raw dependency references declared by the package.
    pub fn references(&self) -> Vec<String> {
        self.dependencies
            .as_ref()
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[test]
    fn test_references_are_dependency_keys() {
        let manifest = Manifest::parse(
            r#"{
                "licenseType": "CC BY",
                "creatorName": "Someone",
                "dependencies": {
                    "B.Thing.1": { "licenseType": "FC", "dependencies": { "C.Deep.2": {} } },
                    "A.Other.latest": {}
                }
            }"#,
        )
        .unwrap();

        let mut refs = manifest.references();
        refs.sort();
        assert_eq!(refs, vec!["A.Other.latest", "B.Thing.1"]);
    }

    #[test]
    fn test_missing_or_null_dependencies() {
        assert!(Manifest::parse(r#"{"creatorName":"x"}"#).unwrap().references().is_empty());
        assert!(Manifest::parse(r#"{"dependencies":null}"#).unwrap().references().is_empty());
        assert!(Manifest::parse(r#"{"dependencies":{}}"#).unwrap().references().is_empty());
    }

    #[test]
    fn test_invalid_manifest() {
        assert!(Manifest::parse("not json").is_err());
        assert!(Manifest::parse(r#"{"dependencies":["A.B.1"]}"#).is_err());
    }

    #[test]
    fn test_load_via_runtime() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/pkgs/A.B.1.var/meta.json");

        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| Ok(r#"{"dependencies":{"C.D.2":{}}}"#.to_string()));

        let manifest = Manifest::load(&runtime, &path).unwrap();
        assert_eq!(manifest.references(), vec!["C.D.2"]);
    }

    #[test]
    fn test_from_reader() {
        let manifest = Manifest::from_reader(r#"{"dependencies":{"X.Y.3":{}}}"#.as_bytes()).unwrap();
        assert_eq!(manifest.references(), vec!["X.Y.3"]);
    }
}
