//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser
//!
//! Exercises `AppConfig::parse()` with arbitrary input to find panics in the
//! TOML parsing and validation pipeline.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Only panics matter here, not the result
        let _ = verstamp_config::AppConfig::parse(s);
    }
});
