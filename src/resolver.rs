//! Resolution of dependency references against package indexes.
//!
//! A concrete reference is satisfied only by that exact version. A `latest`
//! reference is satisfied by the highest version available, whatever it is.

use crate::package::{PackageIdentifier, PackageIndex, Version, VersionNumber};

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Found in the primary collection at this version
    Satisfied(VersionNumber),
    /// Only found in the secondary source, at this version
    SatisfiedExternally(VersionNumber),
    Missing,
}

impl ResolutionResult {
    pub fn is_satisfied(&self) -> bool {
        !matches!(self, ResolutionResult::Missing)
    }

    /// Version the reference resolved to, wherever it was found.
    pub fn version(&self) -> Option<&VersionNumber> {
        match self {
            ResolutionResult::Satisfied(v) | ResolutionResult::SatisfiedExternally(v) => Some(v),
            ResolutionResult::Missing => None,
        }
    }
}

/// Resolve a reference against a single index.
///
/// Only ever returns `Satisfied` or `Missing`.
pub fn resolve(reference: &PackageIdentifier, index: &PackageIndex) -> ResolutionResult {
    let found = match &reference.version {
        Version::Number(version) => index
            .lookup_exact(&reference.creator, &reference.name, version)
            .then(|| version.clone()),
        Version::Latest => index
            .lookup_highest(&reference.creator, &reference.name)
            .cloned(),
    };

    match found {
        Some(version) => ResolutionResult::Satisfied(version),
        None => ResolutionResult::Missing,
    }
}

/// Resolve against the primary index, retrying the secondary one on a miss.
pub fn resolve_with_fallback(
    reference: &PackageIdentifier,
    primary: &PackageIndex,
    secondary: Option<&PackageIndex>,
) -> ResolutionResult {
    match resolve(reference, primary) {
        ResolutionResult::Missing => match secondary.map(|index| resolve(reference, index)) {
            Some(ResolutionResult::Satisfied(version)) => {
                ResolutionResult::SatisfiedExternally(version)
            }
            _ => ResolutionResult::Missing,
        },
        found => found,
    }
}
