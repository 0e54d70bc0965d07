//! Build-time metadata embedded by the build script.
//!
//! Provides verstamp's own version descriptor, git commit hash, and build
//! timestamp for `--version` output and startup logging.

use crate::descriptor::{VersionDescriptor, VersionError};

/// The git commit hash at build time (12 characters), or `unknown`.
pub const GIT_HASH: &str = env!("VERSTAMP_GIT_HASH");

/// The build timestamp as a Unix epoch string.
pub const BUILD_TIMESTAMP: &str = env!("VERSTAMP_BUILD_TIMESTAMP");

/// The build profile (`debug` or `release`).
pub const BUILD_PROFILE: &str = env!("VERSTAMP_BUILD_PROFILE");

/// The crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// verstamp's own version as a descriptor, with the commit hash as build
/// identifier.
pub fn descriptor() -> Result<VersionDescriptor, VersionError> {
    let component = |s: &str| -> u32 { s.parse().unwrap_or(0) };
    VersionDescriptor::new(
        component(env!("CARGO_PKG_VERSION_MAJOR")),
        component(env!("CARGO_PKG_VERSION_MINOR")),
        component(env!("CARGO_PKG_VERSION_PATCH")),
        0,
        GIT_HASH,
    )
}

/// Return a formatted version string including git hash and profile.
///
/// Example: `"0.1.0 (c52f58c3db14, debug)"`
pub fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH}, {BUILD_PROFILE})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_not_empty() {
        let v = version_string();
        assert!(v.contains(VERSION));
        assert!(v.contains(GIT_HASH));
    }

    #[test]
    fn test_descriptor_matches_cargo_version() {
        let d = descriptor().unwrap();
        assert_eq!(d.display_string(), VERSION);
        assert_eq!(d.tweak(), 0);
        assert_eq!(d.build_identifier(), GIT_HASH);
    }

    #[test]
    fn test_git_hash_is_abbreviated_commit_or_unknown() {
        assert!(
            GIT_HASH == "unknown"
                || (GIT_HASH.len() == 12 && GIT_HASH.bytes().all(|b| b.is_ascii_hexdigit())),
            "unexpected hash {GIT_HASH:?}"
        );
    }

    #[test]
    fn test_build_profile() {
        // In test mode, profile is "debug"
        assert_eq!(BUILD_PROFILE, "debug");
    }

    #[test]
    fn test_timestamp_is_numeric() {
        assert!(BUILD_TIMESTAMP.parse::<u64>().is_ok());
    }
}
