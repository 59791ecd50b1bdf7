//! Dependency references embedded in preset files.
//!
//! Presets point at package content with strings like
//! `"Creator.Name.3:/Custom/Atom/Person/Morphs/foo.vmi"`; the part before
//! `:/` is a package reference.

use anyhow::Result;
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path};
use std::sync::LazyLock;

use crate::runtime::Runtime;

/// Directory holding loose presets, relative to the primary root.
pub const PRESET_DIR: &str = "Custom";

/// Extension of preset files.
pub const PRESET_EXTENSION: &str = "vap";

static PRESET_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]+):/[^"]*""#).expect("preset reference pattern is valid")
});

/// A loose preset file and the references it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    /// Path relative to the preset directory, `/`-separated
    pub name: String,
    pub references: Vec<String>,
}

/// Extract package references from preset content.
///
/// Captures without a dot are URL schemes or the `SELF` marker, not packages.
/// The result is de-duplicated and sorted.
pub fn preset_references(content: &str) -> Vec<String> {
    PRESET_REFERENCE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|reference| reference.contains('.'))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Whether a path names a preset file.
pub fn is_preset_file(path: &str) -> bool {
    path.to_ascii_lowercase()
        .ends_with(&format!(".{}", PRESET_EXTENSION))
}

/// Recursive search pattern for preset files below `dir`.
///
/// The extension is matched in any case, like [`is_preset_file`] does for
/// archive entries.
pub fn preset_pattern(dir: &Path) -> String {
    let extension: String = PRESET_EXTENSION
        .chars()
        .map(|c| format!("[{}{}]", c.to_ascii_lowercase(), c.to_ascii_uppercase()))
        .collect();
    format!("{}/**/*.{}", glob::Pattern::escape(&dir.to_string_lossy()), extension)
}

/// Find all loose presets under `<root>/Custom` and read their references.
///
/// Presets that cannot be read are skipped with a warning.
#[tracing::instrument(skip(runtime, root))]
pub fn find_presets<R: Runtime>(runtime: &R, root: &Path) -> Result<Vec<Preset>> {
    let preset_dir = root.join(PRESET_DIR);
    if !runtime.exists(&preset_dir) {
        warn!("Preset directory does not exist: {:?}", preset_dir);
        return Ok(Vec::new());
    }

    let files = runtime.glob(&preset_pattern(&preset_dir))?;
    debug!("Found {} preset file(s) in {:?}", files.len(), preset_dir);

    let mut presets = Vec::new();
    for file in files {
        let content = match runtime.read_to_string(&file) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read preset {:?}: {}", file, e);
                continue;
            }
        };

        presets.push(Preset {
            name: preset_name(&preset_dir, &file),
            references: preset_references(&content),
        });
    }

    Ok(presets)
}

fn preset_name(preset_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(preset_dir).unwrap_or(file);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
