//! The version descriptor and its packed numeric encodings.
//!
//! A [`VersionDescriptor`] holds four version components and an opaque build
//! identifier. Everything else (packed codes, display strings) is derived
//! from those on demand, so the representations can never disagree.
//!
//! ## Packed layout
//!
//! Each component owns [`FIELD_BITS`] bits, most significant first:
//!
//! ```text
//!  31      24 23      16 15       8 7        0
//! +----------+----------+----------+----------+
//! |  major   |  minor   |  patch   |  tweak   |   packed_code()
//! +----------+----------+----------+----------+
//!            |  major   |  minor   |  patch   |   short_numeric_code()
//!            +----------+----------+----------+
//! ```
//!
//! This layout is persisted and compared by consumers and must not change.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Bit width reserved for each component in the packed encodings.
pub const FIELD_BITS: u32 = 8;

/// Largest value any single component may take.
pub const MAX_COMPONENT: u32 = (1 << FIELD_BITS) - 1;

/// Errors raised when constructing or deserializing a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version component: {component} = {value} exceeds maximum {max}")]
    InvalidVersionComponent {
        component: Component,
        value: u32,
        max: u32,
    },

    #[error("packed code mismatch: components encode {expected:#x}, record says {found:#x}")]
    PackedCodeMismatch { expected: u32, found: u32 },
}

/// One of the four numeric version fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Major,
    Minor,
    Patch,
    Tweak,
}

impl Component {
    /// All components, most significant first.
    pub const ALL: [Component; 4] = [
        Component::Major,
        Component::Minor,
        Component::Patch,
        Component::Tweak,
    ];

    /// Largest value this component accepts.
    pub const fn max_value(self) -> u32 {
        MAX_COMPONENT
    }

    /// Position of the component's least significant bit in [`VersionDescriptor::packed_code`].
    pub const fn bit_offset(self) -> u32 {
        match self {
            Component::Major => 3 * FIELD_BITS,
            Component::Minor => 2 * FIELD_BITS,
            Component::Patch => FIELD_BITS,
            Component::Tweak => 0,
        }
    }

    /// Lower-case field name, as used in serialized records.
    pub const fn name(self) -> &'static str {
        match self {
            Component::Major => "major",
            Component::Minor => "minor",
            Component::Patch => "patch",
            Component::Tweak => "tweak",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check(component: Component, value: u32) -> Result<u8, VersionError> {
    u8::try_from(value).map_err(|_| VersionError::InvalidVersionComponent {
        component,
        value,
        max: component.max_value(),
    })
}

/// An immutable application version: `major.minor.patch+tweak` plus a build
/// identifier.
///
/// Construct once at startup (see [`crate::source::resolve`] or
/// [`crate::build_info::descriptor`]) and hand out references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VersionRecord", into = "VersionRecord")]
pub struct VersionDescriptor {
    major: u8,
    minor: u8,
    patch: u8,
    tweak: u8,
    build_identifier: String,
}

impl VersionDescriptor {
    /// Build a descriptor, rejecting any component that does not fit in
    /// [`FIELD_BITS`] bits.
    pub fn new(
        major: u32,
        minor: u32,
        patch: u32,
        tweak: u32,
        build_identifier: impl Into<String>,
    ) -> Result<Self, VersionError> {
        Ok(Self {
            major: check(Component::Major, major)?,
            minor: check(Component::Minor, minor)?,
            patch: check(Component::Patch, patch)?,
            tweak: check(Component::Tweak, tweak)?,
            build_identifier: build_identifier.into(),
        })
    }

    /// Rebuild a descriptor from a value produced by [`packed_code`](Self::packed_code).
    pub fn from_packed(code: u32, build_identifier: impl Into<String>) -> Self {
        let (major, minor, patch, tweak) = decode_packed(code);
        Self {
            major,
            minor,
            patch,
            tweak,
            build_identifier: build_identifier.into(),
        }
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }

    pub fn patch(&self) -> u8 {
        self.patch
    }

    pub fn tweak(&self) -> u8 {
        self.tweak
    }

    /// Value of the given component.
    pub fn component(&self, component: Component) -> u8 {
        match component {
            Component::Major => self.major,
            Component::Minor => self.minor,
            Component::Patch => self.patch,
            Component::Tweak => self.tweak,
        }
    }

    /// The build identifier exactly as supplied.
    pub fn build_identifier(&self) -> &str {
        &self.build_identifier
    }

    /// All four components packed MSB-first (`APPVERSION`).
    ///
    /// Example: `3.1.1+0` packs to `0x0301_0100`.
    pub fn packed_code(&self) -> u32 {
        Component::ALL
            .iter()
            .fold(0, |code, &c| code | (u32::from(self.component(c)) << c.bit_offset()))
    }

    /// Major, minor and patch only (`APP_VERSION_NUMBER`).
    ///
    /// Example: `3.1.1` packs to `0x03_01_01`.
    pub fn short_numeric_code(&self) -> u32 {
        self.packed_code() >> FIELD_BITS
    }

    /// `"{major}.{minor}.{patch}"`
    pub fn display_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// `"{major}.{minor}.{patch}+{tweak}"`
    pub fn extended_display_string(&self) -> String {
        format!("{}+{}", self.display_string(), self.tweak)
    }

    /// Same value as [`extended_display_string`](Self::extended_display_string).
    pub fn tweak_display_string(&self) -> String {
        self.extended_display_string()
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extended_display_string())
    }
}

impl Ord for VersionDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.packed_code()
            .cmp(&other.packed_code())
            .then_with(|| self.build_identifier.cmp(&other.build_identifier))
    }
}

impl PartialOrd for VersionDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split a packed code into `(major, minor, patch, tweak)`.
pub fn decode_packed(code: u32) -> (u8, u8, u8, u8) {
    let [major, minor, patch, tweak] = code.to_be_bytes();
    (major, minor, patch, tweak)
}

/// Split a short numeric code into `(major, minor, patch)`.
///
/// Returns `None` if any bit above the three 8-bit fields is set.
pub fn decode_short(code: u32) -> Option<(u8, u8, u8)> {
    match code.to_be_bytes() {
        [0, major, minor, patch] => Some((major, minor, patch)),
        _ => None,
    }
}

/// Serialized form of a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionRecord {
    major: u32,
    minor: u32,
    patch: u32,
    #[serde(default)]
    tweak: u32,
    build_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    packed_code: Option<u32>,
}

impl From<VersionDescriptor> for VersionRecord {
    fn from(v: VersionDescriptor) -> Self {
        let packed_code = Some(v.packed_code());
        Self {
            major: v.major.into(),
            minor: v.minor.into(),
            patch: v.patch.into(),
            tweak: v.tweak.into(),
            build_identifier: v.build_identifier,
            packed_code,
        }
    }
}

impl TryFrom<VersionRecord> for VersionDescriptor {
    type Error = VersionError;

    fn try_from(record: VersionRecord) -> Result<Self, Self::Error> {
        let descriptor = VersionDescriptor::new(
            record.major,
            record.minor,
            record.patch,
            record.tweak,
            record.build_identifier,
        )?;
        match record.packed_code {
            Some(found) if found != descriptor.packed_code() => {
                Err(VersionError::PackedCodeMismatch {
                    expected: descriptor.packed_code(),
                    found,
                })
            }
            _ => Ok(descriptor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(major: u32, minor: u32, patch: u32, tweak: u32) -> VersionDescriptor {
        VersionDescriptor::new(major, minor, patch, tweak, "test").unwrap()
    }

    #[test]
    fn test_reference_build() {
        let d = VersionDescriptor::new(3, 1, 1, 0, "c52f58c3db14").unwrap();
        assert_eq!(d.display_string(), "3.1.1");
        assert_eq!(d.extended_display_string(), "3.1.1+0");
        assert_eq!(d.tweak_display_string(), "3.1.1+0");
        assert_eq!(d.short_numeric_code(), 0x30101);
        assert_eq!(d.packed_code(), 0x3010100);
        assert_eq!(d.build_identifier(), "c52f58c3db14");
    }

    #[test]
    fn test_rejects_oversized_component() {
        for (i, component) in Component::ALL.iter().enumerate() {
            let mut parts = [1u32; 4];
            parts[i] = 256;
            let err = VersionDescriptor::new(parts[0], parts[1], parts[2], parts[3], "x")
                .unwrap_err();
            assert_eq!(
                err,
                VersionError::InvalidVersionComponent {
                    component: *component,
                    value: 256,
                    max: 255,
                }
            );
        }
    }

    #[test]
    fn test_accepts_all_components_at_max() {
        let d = v(255, 255, 255, 255);
        assert_eq!(d.packed_code(), u32::MAX);
        assert_eq!(d.short_numeric_code(), 0x00ff_ffff);
        assert_eq!(d.display_string(), "255.255.255");
    }

    #[test]
    fn test_packed_code_decodes_to_components() {
        for &(a, b, c, d) in &[(0, 0, 0, 0), (3, 1, 1, 0), (1, 255, 0, 7), (255, 0, 254, 1)] {
            let desc = v(a, b, c, d);
            let (ma, mi, pa, tw) = decode_packed(desc.packed_code());
            assert_eq!(
                (u32::from(ma), u32::from(mi), u32::from(pa), u32::from(tw)),
                (a, b, c, d)
            );
            assert_eq!(VersionDescriptor::from_packed(desc.packed_code(), "test"), desc);
        }
    }

    #[test]
    fn test_short_code_decodes() {
        assert_eq!(decode_short(0x30101), Some((3, 1, 1)));
        assert_eq!(decode_short(0x3010100), None);
    }

    #[test]
    fn test_packed_code_monotonic() {
        let base = v(2, 5, 9, 3);
        assert!(v(2, 5, 10, 3).packed_code() > base.packed_code());
        assert!(v(2, 6, 0, 0).packed_code() > base.packed_code());
        assert!(v(3, 0, 0, 0).packed_code() > base.packed_code());
        assert!(v(2, 5, 9, 4).packed_code() > base.packed_code());
        // A lower patch with a higher tweak still sorts below.
        assert!(v(2, 5, 8, 255).packed_code() < base.packed_code());
    }

    #[test]
    fn test_display_has_no_leading_zeros() {
        let d = v(10, 0, 7, 42);
        assert_eq!(d.display_string(), "10.0.7");
        assert_eq!(d.extended_display_string(), "10.0.7+42");
        assert_eq!(d.to_string(), d.extended_display_string());
        assert_eq!(
            d.extended_display_string(),
            format!("{}+{}", d.display_string(), d.tweak())
        );
    }

    #[test]
    fn test_ordering_follows_packed_code() {
        let mut versions = vec![v(1, 2, 0, 0), v(1, 0, 9, 9), v(0, 9, 9, 9), v(1, 2, 0, 1)];
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(|d| d.to_string()).collect();
        assert_eq!(rendered, ["0.9.9+9", "1.0.9+9", "1.2.0+0", "1.2.0+1"]);
    }

    #[test]
    fn test_build_identifier_is_opaque() {
        let d = VersionDescriptor::new(1, 0, 0, 0, "  not a hash!  ").unwrap();
        assert_eq!(d.build_identifier(), "  not a hash!  ");
        let empty = VersionDescriptor::new(1, 0, 0, 0, "").unwrap();
        assert_eq!(empty.build_identifier(), "");
    }

    #[test]
    fn test_component_layout() {
        assert_eq!(Component::Major.bit_offset(), 24);
        assert_eq!(Component::Tweak.bit_offset(), 0);
        assert_eq!(Component::Patch.to_string(), "patch");
        assert_eq!(Component::Minor.max_value(), MAX_COMPONENT);
    }
}
