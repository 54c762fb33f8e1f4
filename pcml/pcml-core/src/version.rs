//! Host version numbers and the per-node version gate.

use std::fmt;

/// Packed `version.release.modification` host level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vrm(i64);

impl Vrm {
    pub fn new(version: u8, release: u8, modification: u8) -> Self {
        Self(((version as i64) << 16) | ((release as i64) << 8) | modification as i64)
    }

    pub fn from_packed(packed: i64) -> Self {
        Self(packed)
    }

    pub fn packed(&self) -> i64 {
        self.0
    }

    /// Parse `V7R3M0` style text (case-insensitive) or a packed integer.
    pub fn parse(text: &str) -> Option<Self> {
        let t = text.trim();
        if let Ok(packed) = t.parse::<i64>() {
            return Some(Self(packed));
        }
        let upper = t.to_ascii_uppercase();
        let rest = upper.strip_prefix('V')?;
        let (version, rest) = rest.split_once('R')?;
        let (release, modification) = rest.split_once('M')?;
        Some(Self::new(
            version.parse().ok()?,
            release.parse().ok()?,
            modification.parse().ok()?,
        ))
    }
}

impl fmt::Display for Vrm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V{}R{}M{}",
            (self.0 >> 16) & 0xFF,
            (self.0 >> 8) & 0xFF,
            self.0 & 0xFF
        )
    }
}

/// Inclusive range of host levels at which a node is present in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: i64,
    pub max: i64,
}

impl VersionRange {
    pub const UNBOUNDED: Self = Self {
        min: i64::MIN,
        max: i64::MAX,
    };

    pub fn contains(&self, host_vrm: i64) -> bool {
        host_vrm >= self.min && host_vrm <= self.max
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Supplies the level of the host the call will run on.
pub trait HostVersion: Send + Sync {
    fn current_vrm(&self) -> i64;
}

/// [`HostVersion`] returning a fixed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHostVersion(pub Vrm);

impl HostVersion for FixedHostVersion {
    fn current_vrm(&self) -> i64 {
        self.0.packed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vrm_text() {
        assert_eq!(Vrm::parse("V5R4M0"), Some(Vrm::new(5, 4, 0)));
        assert_eq!(Vrm::parse("v7r3m0").map(|v| v.packed()), Some(0x070300));
        assert_eq!(Vrm::parse("458752"), Some(Vrm::from_packed(458752)));
        assert_eq!(Vrm::parse("V7"), None);
        assert_eq!(Vrm::new(7, 4, 0).to_string(), "V7R4M0");
    }

    #[test]
    fn range_is_inclusive() {
        let range = VersionRange {
            min: Vrm::new(5, 4, 0).packed(),
            max: Vrm::new(7, 1, 0).packed(),
        };
        assert!(range.contains(Vrm::new(5, 4, 0).packed()));
        assert!(range.contains(Vrm::new(7, 1, 0).packed()));
        assert!(!range.contains(Vrm::new(7, 2, 0).packed()));
        assert!(VersionRange::UNBOUNDED.contains(i64::MIN));
    }
}
