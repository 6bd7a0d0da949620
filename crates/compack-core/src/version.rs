//! Component version expressions

use semver::Version;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Configuration value that asks for the next patch version
pub const NEXT_PATCH: &str = "NEXT_PATCH";

/// Version used when nothing has been built or published yet
pub const FALLBACK_VERSION: &str = "1.0.0";

/// A configured component version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionExpression {
    /// A fixed semantic version
    Literal(Version),
    /// Compute the next patch version from the versions that already exist
    NextPatch,
}

impl FromStr for VersionExpression {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == NEXT_PATCH {
            return Ok(Self::NextPatch);
        }
        Version::parse(s)
            .map(Self::Literal)
            .map_err(|e| CoreError::InvalidVersion {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for VersionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{}", v),
            Self::NextPatch => f.write_str(NEXT_PATCH),
        }
    }
}

/// Plain `major.minor.patch` triple compared numerically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTriple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionTriple {
    /// Parse `major.minor.patch` made of digits only
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parse_segment(parts.next()?)?;
        let minor = parse_segment(parts.next()?)?;
        let patch = parse_segment(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Parse after dropping any pre-release or build suffix (from the first `-` or `+`)
    pub fn parse_release(s: &str) -> Option<Self> {
        let core = s.split(['-', '+']).next().unwrap_or(s);
        Self::parse(core.trim())
    }

    /// `None` when the patch number is already `u64::MAX`
    pub fn next_patch(self) -> Option<Self> {
        Some(Self {
            patch: self.patch.checked_add(1)?,
            ..self
        })
    }
}

fn parse_segment(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        assert_eq!("NEXT_PATCH".parse::<VersionExpression>().unwrap(), VersionExpression::NextPatch);
        assert_eq!(
            "1.2.3".parse::<VersionExpression>().unwrap(),
            VersionExpression::Literal(Version::new(1, 2, 3))
        );
        assert_eq!(
            "1.0.0-rc.1".parse::<VersionExpression>().unwrap().to_string(),
            "1.0.0-rc.1"
        );
    }

    #[test]
    fn test_parse_expression_rejects_garbage() {
        let err = "next_patch".parse::<VersionExpression>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidVersion { .. }));
        assert!("1.0".parse::<VersionExpression>().is_err());
    }

    #[test]
    fn test_triple_compares_numerically() {
        let a = VersionTriple::parse("1.2.10").unwrap();
        let b = VersionTriple::parse("1.2.3").unwrap();
        assert!(a > b);
    }

    #[test]
    fn test_triple_strict_pattern() {
        assert!(VersionTriple::parse("1.2").is_none());
        assert!(VersionTriple::parse("1.2.3.4").is_none());
        assert!(VersionTriple::parse("1.2.x").is_none());
        assert!(VersionTriple::parse("1.2.-3").is_none());
        assert!(VersionTriple::parse("1.2.3-rc").is_none());
    }

    #[test]
    fn test_parse_release_strips_suffix() {
        assert_eq!(VersionTriple::parse_release("1.0.6-rc.1").unwrap().to_string(), "1.0.6");
        assert_eq!(VersionTriple::parse_release("2.1.0+build.5").unwrap().to_string(), "2.1.0");
        assert_eq!(
            VersionTriple::parse_release("1.0.6").unwrap().next_patch().unwrap().to_string(),
            "1.0.7"
        );
    }

    #[test]
    fn test_next_patch_at_u64_max() {
        let max = VersionTriple::parse("1.0.18446744073709551615").unwrap();
        assert_eq!(max.patch, u64::MAX);
        assert!(max.next_patch().is_none());
    }
}
