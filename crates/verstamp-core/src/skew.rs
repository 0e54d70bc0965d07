//! Version skew detection between peers.
//!
//! Peers exchange packed codes (or short numeric codes) and use [`Skew`] to
//! decide whether they can talk to each other.

use std::cmp::Ordering;
use std::fmt;

use crate::descriptor::{Component, VersionDescriptor, decode_packed, decode_short};

/// The most significant component in which two versions differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Skew {
    Same,
    Tweak,
    Patch,
    Minor,
    Major,
}

impl Skew {
    /// Compare two descriptors.
    pub fn between(a: &VersionDescriptor, b: &VersionDescriptor) -> Self {
        Self::between_codes(a.packed_code(), b.packed_code())
    }

    /// Compare two packed codes.
    pub fn between_codes(a: u32, b: u32) -> Self {
        let (a, b) = (decode_packed(a), decode_packed(b));
        Self::from_parts([a.0, a.1, a.2, a.3], [b.0, b.1, b.2, b.3])
    }

    /// Compare two short numeric codes. Tweak is not part of these, so the
    /// result is never [`Skew::Tweak`]. Returns `None` if either code has bits
    /// set above the three fields.
    pub fn between_short(a: u32, b: u32) -> Option<Self> {
        let (a, b) = (decode_short(a)?, decode_short(b)?);
        Some(Self::from_parts([a.0, a.1, a.2, 0], [b.0, b.1, b.2, 0]))
    }

    fn from_parts(a: [u8; 4], b: [u8; 4]) -> Self {
        Component::ALL
            .iter()
            .zip(a.iter().zip(b.iter()))
            .find(|(_, (x, y))| x != y)
            .map_or(Skew::Same, |(component, _)| Skew::from(*component))
    }

    /// Whether the two sides share `major.minor`.
    pub fn is_compatible(self) -> bool {
        matches!(self, Skew::Same | Skew::Tweak | Skew::Patch)
    }
}

impl From<Component> for Skew {
    fn from(component: Component) -> Self {
        match component {
            Component::Major => Skew::Major,
            Component::Minor => Skew::Minor,
            Component::Patch => Skew::Patch,
            Component::Tweak => Skew::Tweak,
        }
    }
}

impl fmt::Display for Skew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Skew::Same => "same",
            Skew::Tweak => "tweak",
            Skew::Patch => "patch",
            Skew::Minor => "minor",
            Skew::Major => "major",
        })
    }
}

/// Precedence of `a` relative to `b`, ignoring build identifiers.
pub fn compare(a: &VersionDescriptor, b: &VersionDescriptor) -> Ordering {
    a.packed_code().cmp(&b.packed_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(major: u32, minor: u32, patch: u32, tweak: u32, id: &str) -> VersionDescriptor {
        VersionDescriptor::new(major, minor, patch, tweak, id).unwrap()
    }

    #[test]
    fn test_identical_versions_have_no_skew() {
        let a = v(3, 1, 1, 0, "aaaa");
        let b = v(3, 1, 1, 0, "bbbb");
        assert_eq!(Skew::between(&a, &b), Skew::Same);
        assert_eq!(compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_reports_most_significant_difference() {
        let base = v(3, 1, 1, 0, "x");
        assert_eq!(Skew::between(&base, &v(3, 1, 1, 9, "x")), Skew::Tweak);
        assert_eq!(Skew::between(&base, &v(3, 1, 2, 9, "x")), Skew::Patch);
        assert_eq!(Skew::between(&base, &v(3, 0, 1, 0, "x")), Skew::Minor);
        assert_eq!(Skew::between(&base, &v(4, 0, 0, 0, "x")), Skew::Major);
    }

    #[test]
    fn test_compatibility() {
        assert!(Skew::Same.is_compatible());
        assert!(Skew::Tweak.is_compatible());
        assert!(Skew::Patch.is_compatible());
        assert!(!Skew::Minor.is_compatible());
        assert!(!Skew::Major.is_compatible());
    }

    #[test]
    fn test_short_codes() {
        assert_eq!(Skew::between_short(0x30101, 0x30102), Some(Skew::Patch));
        assert_eq!(Skew::between_short(0x30101, 0x30101), Some(Skew::Same));
        assert_eq!(Skew::between_short(0x3010100, 0x30101), None);
    }

    #[test]
    fn test_compare_ignores_build_identifier() {
        let older = v(1, 9, 0, 0, "zzzz");
        let newer = v(2, 0, 0, 0, "aaaa");
        assert_eq!(compare(&older, &newer), Ordering::Less);
        assert_eq!(compare(&newer, &older), Ordering::Greater);
    }
}
