//! Integer image versions and their registry tag form
//!
//! Versions are published as fixed-width `vNNN` tags (`v007`) but parsed back
//! as plain integers, so `v7`, `v007` and `v1234` all round-trip.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"^v(\d+)$").unwrap())
}

/// Integer version of an image within its repository.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u32);

impl Version {
    /// Starting version for a repository with no published history.
    pub const FIRST: Version = Version(1);

    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }

    /// Tag form used when publishing: leading `v`, zero-padded to width 3.
    pub fn tag(self) -> String {
        format!("v{:03}", self.0)
    }

    /// Parse a registry tag. Tags not in `vX` form with an integer `X`
    /// (e.g. `latest`, `v1.2`) yield `None` and are ignored by callers.
    pub fn parse_tag(tag: &str) -> Option<Version> {
        let captures = tag_re().captures(tag)?;
        captures[1].parse::<u32>().ok().map(Version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_zero_padded() {
        assert_eq!(Version::new(1).tag(), "v001");
        assert_eq!(Version::new(42).tag(), "v042");
        assert_eq!(Version::new(1234).tag(), "v1234");
    }

    #[test]
    fn parse_accepts_any_integer_width() {
        assert_eq!(Version::parse_tag("v7"), Some(Version::new(7)));
        assert_eq!(Version::parse_tag("v007"), Some(Version::new(7)));
        assert_eq!(Version::parse_tag("v1234"), Some(Version::new(1234)));
    }

    #[test]
    fn parse_rejects_non_version_tags() {
        assert_eq!(Version::parse_tag("latest"), None);
        assert_eq!(Version::parse_tag("v1.2"), None);
        assert_eq!(Version::parse_tag("v"), None);
        assert_eq!(Version::parse_tag("7"), None);
        assert_eq!(Version::parse_tag("V7"), None);
    }

    #[test]
    fn next_increments() {
        assert_eq!(Version::new(4).next(), Version::new(5));
    }
}
