//! Version model and constraint matching.
//!
//! A [`Version`] is parsed once from a directory name or constraint string and is
//! immutable afterwards. Ordering pads the shorter numeric sequence with zeros, so
//! `1.0` and `1.0.0` are the same version.
//!
//! Constraints live in [`matcher`]: the closed [`VersionMatcher`] enum covers the
//! built-in styles (exact, range, any, latest), and the [`Constraint`] trait lets
//! callers plug in their own rule.

mod matcher;

pub use matcher::{Bound, Constraint, VersionMatcher};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ResolveError;

/// A parsed version: dot-separated numeric components and an optional qualifier.
///
/// Grammar: `<number>('.'<number>)*('-'<qualifier>)?`. The qualifier marks a
/// pre-release or snapshot build and sorts before the plain release with the same
/// numbers (`1.0.0-rc.1 < 1.0.0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u64>,
    qualifier: Option<String>,
}

impl Version {
    /// Parse a version string.
    ///
    /// The input is not trimmed; surrounding or internal whitespace is rejected.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        if raw.is_empty() {
            return Err(ResolveError::invalid_format(raw, "version string is empty"));
        }

        let (numbers, qualifier) = match raw.split_once('-') {
            Some((numbers, qualifier)) => (numbers, Some(qualifier)),
            None => (raw, None),
        };

        let components = numbers
            .split('.')
            .map(|segment| parse_segment(raw, segment))
            .collect::<Result<Vec<_>, _>>()?;

        let qualifier = match qualifier {
            Some(qualifier) => Some(parse_qualifier(raw, qualifier)?),
            None => None,
        };

        Ok(Self {
            components,
            qualifier,
        })
    }

    /// Numeric components as parsed (no padding applied).
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Components with trailing zeros removed; equal versions share this slice.
    fn significant_components(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |idx| idx + 1);
        &self.components[..len]
    }
}

fn parse_segment(raw: &str, segment: &str) -> Result<u64, ResolveError> {
    if segment.is_empty() {
        return Err(ResolveError::invalid_format(raw, "empty numeric segment"));
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ResolveError::invalid_format(
            raw,
            format!("segment '{}' is not numeric", segment),
        ));
    }
    segment.parse::<u64>().map_err(|_| {
        ResolveError::invalid_format(raw, format!("segment '{}' is out of range", segment))
    })
}

fn parse_qualifier(raw: &str, qualifier: &str) -> Result<String, ResolveError> {
    if qualifier.is_empty() {
        return Err(ResolveError::invalid_format(raw, "qualifier after '-' is empty"));
    }
    if let Some(c) = qualifier
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        return Err(ResolveError::invalid_format(
            raw,
            format!("qualifier contains invalid character {:?}", c),
        ));
    }
    if qualifier.split('.').any(str::is_empty) {
        return Err(ResolveError::invalid_format(
            raw,
            "qualifier contains an empty identifier",
        ));
    }
    Ok(qualifier.to_string())
}

/// Qualifier identifier, normalised for comparison and hashing.
#[derive(Debug, PartialEq, Eq, Hash)]
enum Identifier {
    /// Digits with leading zeros stripped.
    Numeric(String),
    /// ASCII-lowercased text.
    Text(String),
}

impl Identifier {
    fn new(ident: &str) -> Self {
        if ident.bytes().all(|b| b.is_ascii_digit()) {
            let trimmed = ident.trim_start_matches('0');
            Identifier::Numeric(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
        } else {
            Identifier::Text(ident.to_ascii_lowercase())
        }
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Without leading zeros, a longer digit string is the larger number.
            (Identifier::Numeric(a), Identifier::Numeric(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Identifier::Numeric(_), Identifier::Text(_)) => Ordering::Less,
            (Identifier::Text(_), Identifier::Numeric(_)) => Ordering::Greater,
            (Identifier::Text(a), Identifier::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn identifiers(qualifier: &str) -> impl Iterator<Item = Identifier> + '_ {
    qualifier.split('.').map(Identifier::new)
}

fn compare_qualifiers(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => identifiers(a).cmp(identifiers(b)),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for idx in 0..len {
            let a = self.components.get(idx).copied().unwrap_or(0);
            let b = other.components.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        compare_qualifiers(self.qualifier(), other.qualifier())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_components().hash(state);
        match &self.qualifier {
            Some(qualifier) => {
                true.hash(state);
                for ident in identifiers(qualifier) {
                    ident.hash(state);
                }
            }
            None => false.hash(state),
        }
    }
}

/// Canonical rendering: numbers without leading zeros, qualifier verbatim.
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers = self
            .components
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&numbers)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "-{}", qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}
