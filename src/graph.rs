//! Dependency graph across a package collection.
//!
//! The graph is built from an immutable [`Collection`] snapshot and two
//! indexes; everything else (unused packages, missing references, name
//! queries) is derived from it on demand.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::package::{PackageIdentifier, PackageIndex, normalize};
use crate::resolver::{ResolutionResult, resolve_with_fallback};

/// Something that declares dependency references.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirer {
    Package(PackageIdentifier),
    /// Loose preset, by its path relative to the preset directory
    Preset(String),
}

impl fmt::Display for Requirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirer::Package(id) => write!(f, "{}", id),
            Requirer::Preset(name) => f.write_str(name),
        }
    }
}

/// Snapshot of everything found in the primary collection: packages and
/// loose presets, each with the raw references they declare.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    requirers: BTreeMap<Requirer, Vec<String>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a package. Registering the same package twice appends references.
    pub fn add_package(&mut self, id: PackageIdentifier, references: Vec<String>) {
        self.requirers
            .entry(Requirer::Package(id))
            .or_default()
            .extend(references);
    }

    pub fn add_preset(&mut self, name: impl Into<String>, references: Vec<String>) {
        self.requirers
            .entry(Requirer::Preset(name.into()))
            .or_default()
            .extend(references);
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageIdentifier> {
        self.requirers.keys().filter_map(|r| match r {
            Requirer::Package(id) => Some(id),
            Requirer::Preset(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.requirers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirers.is_empty()
    }
}

/// One declared reference and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// The reference exactly as declared
    pub raw: String,
    /// Parsed reference; `None` when the raw string is malformed
    pub reference: Option<PackageIdentifier>,
    pub result: ResolutionResult,
}

impl ResolvedReference {
    /// Canonical form of the reference, or the raw string if it is malformed.
    pub fn canonical(&self) -> String {
        match &self.reference {
            Some(reference) => reference.to_string(),
            None => self.raw.clone(),
        }
    }

    /// The primary-collection package this reference points at.
    pub fn satisfied_by(&self) -> Option<PackageIdentifier> {
        match (&self.reference, &self.result) {
            (Some(reference), ResolutionResult::Satisfied(v)) => {
                Some(reference.with_version(v.clone()))
            }
            _ => None,
        }
    }

    /// The secondary-source package this reference points at.
    pub fn satisfied_externally_by(&self) -> Option<PackageIdentifier> {
        match (&self.reference, &self.result) {
            (Some(reference), ResolutionResult::SatisfiedExternally(v)) => {
                Some(reference.with_version(v.clone()))
            }
            _ => None,
        }
    }
}

/// A reference found in the secondary source, with everyone needing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMatch {
    pub package: PackageIdentifier,
    pub requirers: BTreeSet<Requirer>,
}

/// Requirer to resolved references, for every requirer in the collection.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<Requirer, Vec<ResolvedReference>>,
}

/// Resolve every reference of every requirer in the collection.
///
/// Malformed references are kept as `Missing` with their raw text. Blank
/// references are dropped.
#[tracing::instrument(skip_all)]
pub fn build_graph(
    collection: &Collection,
    primary: &PackageIndex,
    secondary: Option<&PackageIndex>,
) -> DependencyGraph {
    let mut edges = BTreeMap::new();

    for (requirer, raw_references) in &collection.requirers {
        let resolved = raw_references
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| match normalize(raw) {
                Ok(reference) => ResolvedReference {
                    raw: raw.clone(),
                    result: resolve_with_fallback(&reference, primary, secondary),
                    reference: Some(reference),
                },
                Err(e) => {
                    debug!("{} (declared by {})", e, requirer);
                    ResolvedReference {
                        raw: raw.clone(),
                        reference: None,
                        result: ResolutionResult::Missing,
                    }
                }
            })
            .collect();
        edges.insert(requirer.clone(), resolved);
    }

    DependencyGraph { edges }
}

impl DependencyGraph {
    pub fn iter(&self) -> impl Iterator<Item = (&Requirer, &[ResolvedReference])> {
        self.edges.iter().map(|(r, refs)| (r, refs.as_slice()))
    }

    pub fn references(&self, requirer: &Requirer) -> Option<&[ResolvedReference]> {
        self.edges.get(requirer).map(Vec::as_slice)
    }

    /// Packages of the primary collection, sorted.
    pub fn packages(&self) -> impl Iterator<Item = &PackageIdentifier> {
        self.edges.keys().filter_map(|r| match r {
            Requirer::Package(id) => Some(id),
            Requirer::Preset(_) => None,
        })
    }

    fn resolved(&self) -> impl Iterator<Item = (&Requirer, &ResolvedReference)> {
        self.edges
            .iter()
            .flat_map(|(requirer, refs)| refs.iter().map(move |r| (requirer, r)))
    }

    /// For every package used by someone else, who uses it.
    ///
    /// A package referencing itself does not count.
    pub fn dependants(&self) -> BTreeMap<PackageIdentifier, BTreeSet<Requirer>> {
        let mut dependants: BTreeMap<PackageIdentifier, BTreeSet<Requirer>> = BTreeMap::new();
        for (requirer, reference) in self.resolved() {
            let Some(target) = reference.satisfied_by() else {
                continue;
            };
            if matches!(requirer, Requirer::Package(id) if *id == target) {
                continue;
            }
            dependants.entry(target).or_default().insert(requirer.clone());
        }
        dependants
    }

    /// Requirers (other than the package itself) depending on `package`.
    pub fn dependants_of(&self, package: &PackageIdentifier) -> BTreeSet<Requirer> {
        self.dependants().remove(package).unwrap_or_default()
    }

    /// Packages no other requirer resolves to, sorted.
    pub fn unused(&self) -> Vec<PackageIdentifier> {
        let dependants = self.dependants();
        self.packages()
            .filter(|id| !dependants.contains_key(*id))
            .cloned()
            .collect()
    }

    /// Unresolved references (canonical form) and who declares them.
    pub fn missing(&self) -> BTreeMap<String, BTreeSet<Requirer>> {
        let mut missing: BTreeMap<String, BTreeSet<Requirer>> = BTreeMap::new();
        for (requirer, reference) in self.resolved() {
            if reference.result == ResolutionResult::Missing {
                missing
                    .entry(reference.canonical())
                    .or_default()
                    .insert(requirer.clone());
            }
        }
        missing
    }

    /// References resolved inside the primary collection and the package
    /// each one resolved to.
    pub fn satisfied(&self) -> BTreeMap<String, PackageIdentifier> {
        self.resolved()
            .filter_map(|(_, reference)| {
                reference
                    .satisfied_by()
                    .map(|target| (reference.canonical(), target))
            })
            .collect()
    }

    /// References only the secondary source could satisfy.
    pub fn found_externally(&self) -> BTreeMap<String, ExternalMatch> {
        let mut found: BTreeMap<String, ExternalMatch> = BTreeMap::new();
        for (requirer, reference) in self.resolved() {
            let Some(package) = reference.satisfied_externally_by() else {
                continue;
            };
            found
                .entry(reference.canonical())
                .or_insert_with(|| ExternalMatch {
                    package,
                    requirers: BTreeSet::new(),
                })
                .requirers
                .insert(requirer.clone());
        }
        found
    }

    /// Packages whose identifier contains `partial_name` (case-insensitive),
    /// each flagged with whether another requirer depends on it.
    pub fn find_requirers(&self, partial_name: &str) -> Vec<(PackageIdentifier, bool)> {
        let needle = partial_name.to_lowercase();
        let dependants = self.dependants();
        self.packages()
            .filter(|id| id.to_string().to_lowercase().contains(&needle))
            .map(|id| (id.clone(), dependants.contains_key(id)))
            .collect()
    }
}
