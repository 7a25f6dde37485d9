//! Version constraints: the [`Constraint`] trait and the built-in [`VersionMatcher`] kinds.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::Version;
use crate::error::ResolveError;

/// A rule deciding whether an installed version is acceptable.
///
/// Implementations must be pure: `matches` has no side effects and never fails for
/// a parsed [`Version`]. The resolver takes any `Constraint`, so callers can supply
/// their own rule without going through a constraint string.
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Check whether `version` satisfies this constraint.
    fn matches(&self, version: &Version) -> bool;

    /// Human-readable explanation, used in logs and error messages.
    fn description(&self) -> String;

    /// The constraint text as supplied by the caller (trimmed).
    fn to_version_string(&self) -> &str;

    /// Whether the constraint itself asks for the newest matching version.
    ///
    /// When true, the resolver picks the greatest candidate even under
    /// [`SelectionPolicy::Strict`](crate::resolver::SelectionPolicy::Strict).
    fn selects_latest(&self) -> bool {
        false
    }
}

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    pub fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }

    fn admits_from_below(&self, version: &Version) -> bool {
        match version.cmp(&self.version) {
            Ordering::Greater => true,
            Ordering::Equal => self.inclusive,
            Ordering::Less => false,
        }
    }

    fn admits_from_above(&self, version: &Version) -> bool {
        match version.cmp(&self.version) {
            Ordering::Less => true,
            Ordering::Equal => self.inclusive,
            Ordering::Greater => false,
        }
    }
}

/// Built-in constraint kinds.
///
/// Constraint strings are parsed by [`VersionMatcher::parse`]:
///
/// | Input                          | Matcher  |
/// |--------------------------------|----------|
/// | `latest`                       | `Latest` |
/// | `*`, `any`                     | `Any`    |
/// | `[1.0,2.0)`, `(,3]`, `[1.2]`   | `Range`  |
/// | anything else, e.g. `1.2.3`    | `Exact`  |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionMatcher {
    /// Equal to one version (zero-padded equality).
    Exact { version: Version, raw: String },
    /// Between two optional bounds; a missing bound is open-ended.
    Range {
        lower: Option<Bound>,
        upper: Option<Bound>,
        raw: String,
    },
    /// Any installed version; several candidates go through the selection policy.
    Any { raw: String },
    /// The newest installed version, regardless of selection policy.
    Latest { raw: String },
}

impl VersionMatcher {
    /// Parse a constraint string. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::invalid_format(raw, "constraint is empty"));
        }

        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(VersionMatcher::Latest {
                raw: trimmed.to_string(),
            });
        }
        if trimmed == "*" || trimmed.eq_ignore_ascii_case("any") {
            return Ok(VersionMatcher::Any {
                raw: trimmed.to_string(),
            });
        }
        if trimmed.starts_with('[') || trimmed.starts_with('(') {
            return parse_range(trimmed);
        }

        Self::exact(trimmed)
    }

    /// Matcher for exactly one version.
    ///
    /// The string is trimmed before parsing, so `" 1.2.3"` and `"1.2.3"` build
    /// the same matcher.
    pub fn exact(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        let version = Version::parse(trimmed)?;
        Ok(VersionMatcher::Exact {
            version,
            raw: trimmed.to_string(),
        })
    }

    /// Range between two optional bounds.
    pub fn range(lower: Option<Bound>, upper: Option<Bound>) -> Result<Self, ResolveError> {
        let raw = render_range(lower.as_ref(), upper.as_ref());
        validate_bounds(&raw, lower.as_ref(), upper.as_ref())?;
        Ok(VersionMatcher::Range { lower, upper, raw })
    }

    pub fn any() -> Self {
        VersionMatcher::Any {
            raw: "*".to_string(),
        }
    }

    pub fn latest() -> Self {
        VersionMatcher::Latest {
            raw: "latest".to_string(),
        }
    }
}

fn parse_range(trimmed: &str) -> Result<VersionMatcher, ResolveError> {
    let lower_inclusive = trimmed.starts_with('[');
    let upper_inclusive = match trimmed.chars().last() {
        Some(']') if trimmed.len() > 1 => true,
        Some(')') if trimmed.len() > 1 => false,
        _ => {
            return Err(ResolveError::invalid_format(
                trimmed,
                "range must end with ']' or ')'",
            ));
        }
    };
    let inner = &trimmed[1..trimmed.len() - 1];

    let (lower, upper) = match inner.split_once(',') {
        None => {
            // "[1.2]" pins a single version.
            if !(lower_inclusive && upper_inclusive) {
                return Err(ResolveError::invalid_format(
                    trimmed,
                    "single-version range must use '[' and ']'",
                ));
            }
            let version = parse_bound(trimmed, inner)?;
            (
                Some(Bound::inclusive(version.clone())),
                Some(Bound::inclusive(version)),
            )
        }
        Some((_, upper)) if upper.contains(',') => {
            return Err(ResolveError::invalid_format(
                trimmed,
                "range has more than two bounds",
            ));
        }
        Some((lower, upper)) => {
            let lower = optional_bound(trimmed, lower, lower_inclusive)?;
            let upper = optional_bound(trimmed, upper, upper_inclusive)?;
            (lower, upper)
        }
    };

    validate_bounds(trimmed, lower.as_ref(), upper.as_ref())?;
    Ok(VersionMatcher::Range {
        lower,
        upper,
        raw: trimmed.to_string(),
    })
}

fn parse_bound(raw: &str, text: &str) -> Result<Version, ResolveError> {
    Version::parse(text.trim()).map_err(|err| match err {
        ResolveError::InvalidVersionFormat { reason, .. } => ResolveError::invalid_format(
            raw,
            format!("bound '{}': {}", text.trim(), reason),
        ),
        other => other,
    })
}

fn optional_bound(raw: &str, text: &str, inclusive: bool) -> Result<Option<Bound>, ResolveError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let version = parse_bound(raw, text)?;
    Ok(Some(Bound { version, inclusive }))
}

fn validate_bounds(
    raw: &str,
    lower: Option<&Bound>,
    upper: Option<&Bound>,
) -> Result<(), ResolveError> {
    let (Some(lower), Some(upper)) = (lower, upper) else {
        return Ok(());
    };
    match lower.version.cmp(&upper.version) {
        Ordering::Greater => Err(ResolveError::invalid_format(
            raw,
            format!(
                "lower bound {} is greater than upper bound {}",
                lower.version, upper.version
            ),
        )),
        Ordering::Equal if !(lower.inclusive && upper.inclusive) => Err(
            ResolveError::invalid_format(raw, "range excludes every version"),
        ),
        _ => Ok(()),
    }
}

fn render_range(lower: Option<&Bound>, upper: Option<&Bound>) -> String {
    if let (Some(l), Some(u)) = (lower, upper)
        && l.inclusive
        && u.inclusive
        && l.version == u.version
    {
        return format!("[{}]", l.version);
    }
    format!(
        "{}{},{}{}",
        if lower.is_some_and(|b| b.inclusive) { '[' } else { '(' },
        lower.map(|b| b.version.to_string()).unwrap_or_default(),
        upper.map(|b| b.version.to_string()).unwrap_or_default(),
        if upper.is_some_and(|b| b.inclusive) { ']' } else { ')' },
    )
}

impl Constraint for VersionMatcher {
    fn matches(&self, version: &Version) -> bool {
        match self {
            VersionMatcher::Exact { version: exact, .. } => exact == version,
            VersionMatcher::Range { lower, upper, .. } => {
                lower.as_ref().is_none_or(|b| b.admits_from_below(version))
                    && upper.as_ref().is_none_or(|b| b.admits_from_above(version))
            }
            VersionMatcher::Any { .. } | VersionMatcher::Latest { .. } => true,
        }
    }

    fn description(&self) -> String {
        match self {
            VersionMatcher::Exact { .. } => format!("Exact version: {}", self),
            VersionMatcher::Range { .. } => format!("Version range: {}", self),
            VersionMatcher::Any { .. } => "Any version".to_string(),
            VersionMatcher::Latest { .. } => "Latest version".to_string(),
        }
    }

    fn to_version_string(&self) -> &str {
        match self {
            VersionMatcher::Exact { raw, .. }
            | VersionMatcher::Range { raw, .. }
            | VersionMatcher::Any { raw }
            | VersionMatcher::Latest { raw } => raw,
        }
    }

    fn selects_latest(&self) -> bool {
        matches!(self, VersionMatcher::Latest { .. })
    }
}

/// Canonical form, built from the parsed versions rather than the input text.
impl fmt::Display for VersionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionMatcher::Exact { version, .. } => write!(f, "{}", version),
            VersionMatcher::Range { lower, upper, .. } => {
                f.write_str(&render_range(lower.as_ref(), upper.as_ref()))
            }
            VersionMatcher::Any { .. } => f.write_str("*"),
            VersionMatcher::Latest { .. } => f.write_str("latest"),
        }
    }
}

impl FromStr for VersionMatcher {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionMatcher::parse(s)
    }
}

impl TryFrom<String> for VersionMatcher {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VersionMatcher::parse(&value)
    }
}

impl From<VersionMatcher> for String {
    fn from(matcher: VersionMatcher) -> Self {
        matcher.to_version_string().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[test]
    fn test_exact_trims_input() {
        let matcher = VersionMatcher::exact(" 1.2.3 ").unwrap();
        assert_eq!(matcher.to_version_string(), "1.2.3");
        assert_eq!(matcher.description(), "Exact version: 1.2.3");
        assert_eq!(matcher, VersionMatcher::exact("1.2.3").unwrap());
    }

    #[test]
    fn test_exact_keeps_raw_text_but_describes_canonical_form() {
        let matcher = VersionMatcher::exact("01.02").unwrap();
        assert_eq!(matcher.to_version_string(), "01.02");
        assert_eq!(matcher.description(), "Exact version: 1.2");
        assert_eq!(matcher.to_string(), "1.2");
    }

    #[rstest]
    #[case("1.2.3")]
    #[case("0.1")]
    #[case("2.0.0-SNAPSHOT")]
    fn test_exact_matches_only_its_version(#[case] raw: &str) {
        let version = v(raw);
        let matcher = VersionMatcher::exact(&version.to_string()).unwrap();
        assert!(matcher.matches(&version));
        assert!(!matcher.matches(&v("9.9.9")));
        assert!(!matcher.matches(&v(&format!("{}.1", version))));
    }

    #[test]
    fn test_exact_uses_zero_padding() {
        let matcher = VersionMatcher::exact("1.0").unwrap();
        assert!(matcher.matches(&v("1.0.0")));
        assert!(!matcher.matches(&v("1.0.0-rc.1")));
    }

    #[rstest]
    #[case("not-a-version")]
    #[case("")]
    #[case("   ")]
    #[case("1 .0")]
    fn test_exact_rejects_malformed_input(#[case] raw: &str) {
        assert!(matches!(
            VersionMatcher::parse(raw),
            Err(ResolveError::InvalidVersionFormat { .. })
        ));
    }

    #[rstest]
    #[case("latest", "Latest version")]
    #[case(" LATEST ", "Latest version")]
    #[case("*", "Any version")]
    #[case("Any", "Any version")]
    #[case("1.2.3", "Exact version: 1.2.3")]
    #[case("[1.0,2.0)", "Version range: [1.0,2.0)")]
    #[case("( , 2 ]", "Version range: (,2]")]
    #[case("[1.5]", "Version range: [1.5]")]
    fn test_parse_descriptions(#[case] raw: &str, #[case] description: &str) {
        let matcher = VersionMatcher::parse(raw).unwrap();
        assert_eq!(matcher.description(), description);
        assert_eq!(matcher.to_version_string(), raw.trim());
    }

    #[rstest]
    #[case("[1.0,2.0)", "1.0", true)]
    #[case("[1.0,2.0)", "1.9.9", true)]
    #[case("[1.0,2.0)", "2.0.0", false)]
    #[case("[1.0,2.0)", "0.9", false)]
    #[case("(1.0,2.0]", "1.0.0", false)]
    #[case("(1.0,2.0]", "2", true)]
    #[case("[1.0,)", "100.0", true)]
    #[case("(,1.0)", "0.0.1", true)]
    #[case("(,1.0)", "1.0-SNAPSHOT", true)]
    #[case("(,1.0)", "1.0", false)]
    #[case("[1.5]", "1.5.0", true)]
    #[case("[1.5]", "1.5.1", false)]
    #[case("(,)", "42", true)]
    fn test_range_matches(#[case] range: &str, #[case] version: &str, #[case] expected: bool) {
        let matcher = VersionMatcher::parse(range).unwrap();
        assert_eq!(matcher.matches(&v(version)), expected, "{} in {}", version, range);
    }

    #[rstest]
    #[case("[2.0,1.0]")]
    #[case("[1.0,1.0)")]
    #[case("(1.5)")]
    #[case("[1.0,2.0,3.0]")]
    #[case("[1.0,2.0")]
    #[case("[")]
    #[case("[a,2.0]")]
    fn test_range_rejects_malformed_input(#[case] raw: &str) {
        match VersionMatcher::parse(raw) {
            Err(ResolveError::InvalidVersionFormat { raw: reported, .. }) => {
                assert_eq!(reported, raw)
            }
            other => panic!("expected InvalidVersionFormat for {:?}, got {:?}", raw, other),
        }
    }

    #[test]
    fn test_range_constructor_renders_canonical_text() {
        let matcher = VersionMatcher::range(Some(Bound::inclusive(v("01.0"))), None).unwrap();
        assert_eq!(matcher.to_version_string(), "[1.0,)");
        assert!(matcher.matches(&v("3")));

        let err = VersionMatcher::range(
            Some(Bound::exclusive(v("2.0"))),
            Some(Bound::inclusive(v("1.0"))),
        )
        .unwrap_err();
        assert!(err.to_string().contains("lower bound 2.0 is greater than upper bound 1.0"));
    }

    #[test]
    fn test_only_latest_selects_latest() {
        assert!(VersionMatcher::latest().selects_latest());
        assert!(!VersionMatcher::any().selects_latest());
        assert!(!VersionMatcher::parse("[1,2]").unwrap().selects_latest());
    }

    #[test]
    fn test_serde_round_trips_raw_text() {
        let matcher: VersionMatcher = serde_json::from_str("\" [1.0,2.0) \"").unwrap();
        assert!(matches!(matcher, VersionMatcher::Range { .. }));
        assert_eq!(serde_json::to_string(&matcher).unwrap(), "\"[1.0,2.0)\"");

        let err = serde_json::from_str::<VersionMatcher>("\"not-a-version\"").unwrap_err();
        assert!(err.to_string().contains("Invalid version format"));
    }
}
