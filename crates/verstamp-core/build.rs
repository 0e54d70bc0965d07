//! Embeds the identity of this verstamp build: the commit it was built from,
//! when, and under which cargo profile. `src/build_info.rs` reads these back
//! with `env!`.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const UNKNOWN: &str = "unknown";

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env=VERSTAMP_{key}={value}");
}

/// Twelve hex digits, matching the `--abbrev=12` identifiers verstamp
/// stamps into projects.
fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn main() {
    emit("GIT_HASH", commit_hash().as_deref().unwrap_or(UNKNOWN));
    emit("BUILD_TIMESTAMP", &unix_seconds().to_string());
    emit(
        "BUILD_PROFILE",
        &std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string()),
    );

    for watched in ["../../.git/HEAD", "../../.git/refs"] {
        println!("cargo:rerun-if-changed={watched}");
    }
}
