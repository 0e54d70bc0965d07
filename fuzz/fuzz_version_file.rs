//! Fuzz target for the version text parsers.
//!
//! Run with: cargo +nightly fuzz run fuzz_version_file
//!
//! Feeds arbitrary input to the `VERSION` file, version string, and
//! `git describe` parsers. Any descriptor that comes out must survive the
//! packed-code round trip.

#![no_main]

use libfuzzer_sys::fuzz_target;
use verstamp_core::VersionDescriptor;
use verstamp_core::source::{parse_git_describe, parse_version, parse_version_file};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(file) = parse_version_file(s) {
        if let Ok(d) = VersionDescriptor::new(file.major, file.minor, file.patch, file.tweak, "fuzz") {
            assert_eq!(VersionDescriptor::from_packed(d.packed_code(), "fuzz"), d);
        }
    }

    if let Ok(d) = parse_version(s, "fuzz") {
        assert_eq!(VersionDescriptor::from_packed(d.packed_code(), "fuzz"), d);
        assert_eq!(d.extended_display_string(), format!("{}+{}", d.display_string(), d.tweak()));
    }

    let _ = parse_git_describe(s);
});
