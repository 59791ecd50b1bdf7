//! Package identifiers of the form `{creator}.{name}.{version}`.
//!
//! The same shape is used for package file names (always carrying a concrete
//! version) and for dependency references, where the version may also be the
//! `latest` marker.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Version marker meaning "the highest version available".
pub const LATEST: &str = "latest";

/// A non-negative version number of any size.
///
/// Stored as decimal digits without leading zeros, so `007` and `7` are the
/// same version. A shorter digit string is always the smaller number, which
/// keeps ordering numeric without a size limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber(String);

impl VersionNumber {
    pub fn new(number: u64) -> Self {
        Self(number.to_string())
    }

    /// Parse a token made only of ASCII digits.
    pub fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits = token.trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        Some(Self(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version axis of a package identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    Number(VersionNumber),
    Latest,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Number(n) => write!(f, "{}", n),
            Version::Latest => f.write_str(LATEST),
        }
    }
}

/// Identity of a package without its version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageKey {
    pub creator: String,
    pub name: String,
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.creator, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageIdentifier {
    pub creator: String,
    pub name: String,
    pub version: Version,
}

impl PackageIdentifier {
    pub fn new(creator: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            creator: creator.into(),
            name: name.into(),
            version,
        }
    }

    pub fn key(&self) -> PackageKey {
        PackageKey {
            creator: self.creator.clone(),
            name: self.name.clone(),
        }
    }

    /// Same package, pinned to a concrete version.
    pub fn with_version(&self, version: VersionNumber) -> Self {
        Self {
            version: Version::Number(version),
            ..self.clone()
        }
    }

    pub fn is_latest(&self) -> bool {
        self.version == Version::Latest
    }

    /// File name of the package archive (`Creator.Name.3.var`).
    pub fn file_name(&self) -> String {
        format!("{}.var", self)
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.creator, self.name, self.version)
    }
}

impl Serialize for PackageIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for PackageIdentifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Why a raw identifier could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than three dot-separated segments
    TooFewSegments(String),
    /// Creator or name is empty
    EmptySegment(String),
    /// Trailing segment is neither digits nor `latest`
    InvalidVersion { raw: String, token: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooFewSegments(raw) => {
                write!(f, "Malformed reference '{}': expected 'creator.name.version'", raw)
            }
            ParseError::EmptySegment(raw) => {
                write!(f, "Malformed reference '{}': creator and name must not be empty", raw)
            }
            ParseError::InvalidVersion { raw, token } => write!(
                f,
                "Malformed reference '{}': version '{}' must be a number or '{}'",
                raw, token, LATEST
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a raw package file stem or dependency reference.
///
/// The trailing segment is the version, the first segment is the creator and
/// everything in between (dots included) is the name. Creator and name keep
/// their case; only the `latest` marker is matched case-insensitively.
pub fn normalize(raw: &str) -> Result<PackageIdentifier, ParseError> {
    let (rest, token) = raw
        .rsplit_once('.')
        .ok_or_else(|| ParseError::TooFewSegments(raw.to_string()))?;
    let (creator, name) = rest
        .split_once('.')
        .ok_or_else(|| ParseError::TooFewSegments(raw.to_string()))?;

    let version = parse_version(token).ok_or_else(|| ParseError::InvalidVersion {
        raw: raw.to_string(),
        token: token.to_string(),
    })?;

    if creator.is_empty() || name.is_empty() {
        return Err(ParseError::EmptySegment(raw.to_string()));
    }

    Ok(PackageIdentifier::new(creator, name, version))
}

fn parse_version(token: &str) -> Option<Version> {
    if token.eq_ignore_ascii_case(LATEST) {
        return Some(Version::Latest);
    }
    VersionNumber::parse(token).map(Version::Number)
}
