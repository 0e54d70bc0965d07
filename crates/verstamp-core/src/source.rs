//! Version sources: `VERSION` files, version strings, and `git describe`.
//!
//! [`resolve`] is the usual entry point. It reads the project's `VERSION`
//! file, asks git for a build identifier, applies the overrides from
//! [`AppConfig`], and produces the one [`VersionDescriptor`] the rest of the
//! program borrows.
//!
//! ## `VERSION` file format
//!
//! ```text
//! VERSION_MAJOR = 3
//! VERSION_MINOR = 1
//! PATCHLEVEL = 1
//! VERSION_TWEAK = 0
//! EXTRAVERSION =
//! ```

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};
use verstamp_config::{AppConfig, VersionOverrideConfig};

use crate::descriptor::{VersionDescriptor, VersionError};

/// Build identifier used when neither config nor git supplies one.
pub const UNKNOWN_BUILD: &str = "unknown";

/// Errors raised while reading or combining version sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read version file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected `KEY = VALUE`, got {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: duplicate key {key}")]
    DuplicateKey { line: usize, key: String },

    #[error("missing required key {0}")]
    MissingKey(&'static str),

    #[error("{key}: {value:?} is not a non-negative integer")]
    InvalidNumber { key: String, value: String },

    #[error("invalid version string {0:?}")]
    InvalidVersion(String),

    #[error("no version source: no VERSION file, no version tag, and no complete [version] override")]
    NoVersionSource,

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Contents of a `VERSION` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub tweak: u32,
    /// Free-form suffix such as `rc1`. Carried for callers; never part of the
    /// display strings.
    pub extra_version: Option<String>,
}

fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_number(key: &str, value: &str) -> Result<u32, SourceError> {
    parse_component(value).ok_or_else(|| SourceError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse the text of a `VERSION` file.
pub fn parse_version_file(text: &str) -> Result<VersionFile, SourceError> {
    let mut seen = HashSet::new();
    let (mut major, mut minor, mut patch, mut tweak) = (None, None, None, None);
    let mut extra_version = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(SourceError::Malformed {
                line,
                content: trimmed.to_string(),
            });
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err(SourceError::Malformed {
                line,
                content: trimmed.to_string(),
            });
        }
        if !seen.insert(key) {
            return Err(SourceError::DuplicateKey {
                line,
                key: key.to_string(),
            });
        }

        match key {
            "VERSION_MAJOR" => major = Some(parse_number(key, value)?),
            "VERSION_MINOR" => minor = Some(parse_number(key, value)?),
            "PATCHLEVEL" => patch = Some(parse_number(key, value)?),
            "VERSION_TWEAK" => tweak = Some(parse_number(key, value)?),
            "EXTRAVERSION" => extra_version = (!value.is_empty()).then(|| value.to_string()),
            other => debug!(line, key = other, "Ignoring unknown VERSION key"),
        }
    }

    Ok(VersionFile {
        major: major.ok_or(SourceError::MissingKey("VERSION_MAJOR"))?,
        minor: minor.ok_or(SourceError::MissingKey("VERSION_MINOR"))?,
        patch: patch.ok_or(SourceError::MissingKey("PATCHLEVEL"))?,
        tweak: tweak.unwrap_or(0),
        extra_version,
    })
}

/// Read and parse a `VERSION` file using async I/O.
pub async fn load_version_file(path: &Path) -> Result<VersionFile, SourceError> {
    let text = tokio::fs::read_to_string(path).await?;
    let file = parse_version_file(&text)?;
    debug!(path = %path.display(), ?file, "Read VERSION file");
    Ok(file)
}

fn parse_triplet(s: &str) -> Option<[u32; 3]> {
    let s = s.strip_prefix('v').unwrap_or(s);
    let mut parts = s.split('.');
    let triplet = [
        parse_component(parts.next()?)?,
        parse_component(parts.next()?)?,
        parse_component(parts.next()?)?,
    ];
    parts.next().is_none().then_some(triplet)
}

/// Parse a version given on the command line or by a peer.
///
/// Accepts `MAJOR.MINOR.PATCH`, `MAJOR.MINOR.PATCH+TWEAK` (optionally with a
/// leading `v`), or a packed code written as hexadecimal (`0x3010100`).
pub fn parse_version(s: &str, build_identifier: &str) -> Result<VersionDescriptor, SourceError> {
    let s = s.trim();
    let invalid = || SourceError::InvalidVersion(s.to_string());

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let code = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return Ok(VersionDescriptor::from_packed(code, build_identifier));
    }

    let (core, tweak) = match s.split_once('+') {
        Some((core, tweak)) => (core, parse_component(tweak).ok_or_else(invalid)?),
        None => (s, 0),
    };
    let [major, minor, patch] = parse_triplet(core).ok_or_else(invalid)?;
    Ok(VersionDescriptor::new(
        major,
        minor,
        patch,
        tweak,
        build_identifier,
    )?)
}

/// Parsed output of `git describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitDescribe {
    /// Version from the nearest tag, if the tag looks like `vX.Y.Z`.
    pub tag_version: Option<[u32; 3]>,
    /// Commits between the tag and `HEAD`.
    pub commits_since_tag: u32,
    /// Whether the describe text ended in `-dirty`.
    pub dirty: bool,
    /// The describe output, verbatim.
    pub build_identifier: String,
}

fn split_describe_suffix(s: &str) -> (&str, u32) {
    let mut parts = s.rsplitn(3, '-');
    if let (Some(hash), Some(count), Some(tag)) = (parts.next(), parts.next(), parts.next())
        && hash
            .strip_prefix('g')
            .is_some_and(|h| !h.is_empty() && h.bytes().all(|b| b.is_ascii_hexdigit()))
        && let Some(commits) = parse_component(count)
    {
        return (tag, commits);
    }
    (s, 0)
}

/// Parse `git describe` output: `v3.1.1`, `v3.1.1-4-gc52f58c3db14`, or a
/// bare abbreviated hash, each optionally followed by `-dirty`.
pub fn parse_git_describe(s: &str) -> Result<GitDescribe, SourceError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(SourceError::InvalidVersion(trimmed.to_string()));
    }

    let (base, dirty) = match trimmed.strip_suffix("-dirty") {
        Some(base) => (base, true),
        None => (trimmed, false),
    };
    let (tag, commits_since_tag) = split_describe_suffix(base);

    Ok(GitDescribe {
        tag_version: parse_triplet(tag),
        commits_since_tag,
        dirty,
        build_identifier: trimmed.to_string(),
    })
}

/// Run `git describe --abbrev=12 --always` in `dir`. Returns `None` outside
/// a repository or when git is unavailable.
///
/// Local modifications are not marked, so the identifier names a commit
/// and never carries a `-dirty` suffix.
pub async fn describe_repository(dir: &Path) -> Option<GitDescribe> {
    let output = tokio::process::Command::new("git")
        .args(["describe", "--abbrev=12", "--always"])
        .current_dir(dir)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        debug!(dir = %dir.display(), "git describe failed");
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    parse_git_describe(&text).ok()
}

/// Combine the available sources into a descriptor.
///
/// The version tuple comes from the `VERSION` file, else from the git tag.
/// Each configured override then replaces its component. The build
/// identifier is the configured override, else the describe output, else
/// `fallback_build_id`.
pub fn combine(
    file: Option<&VersionFile>,
    describe: Option<&GitDescribe>,
    overrides: &VersionOverrideConfig,
    fallback_build_id: &str,
) -> Result<VersionDescriptor, SourceError> {
    let base = match (file, describe.and_then(|d| d.tag_version)) {
        (Some(f), _) => Some([f.major, f.minor, f.patch, f.tweak]),
        (None, Some([major, minor, patch])) => Some([major, minor, patch, 0]),
        (None, None) => None,
    };
    let pick = |over: Option<u32>, idx: usize| over.or(base.map(|b| b[idx]));

    let (Some(major), Some(minor), Some(patch)) = (
        pick(overrides.major, 0),
        pick(overrides.minor, 1),
        pick(overrides.patch, 2),
    ) else {
        return Err(SourceError::NoVersionSource);
    };
    let tweak = pick(overrides.tweak, 3).unwrap_or(0);

    let build_identifier = overrides
        .build_identifier
        .as_deref()
        .or(describe.map(|d| d.build_identifier.as_str()))
        .unwrap_or(fallback_build_id);

    Ok(VersionDescriptor::new(
        major,
        minor,
        patch,
        tweak,
        build_identifier,
    )?)
}

/// Resolve the project's version from the sources configured in `config`,
/// with paths relative to `base_dir`.
pub async fn resolve(
    config: &AppConfig,
    base_dir: &Path,
) -> Result<VersionDescriptor, SourceError> {
    let path = base_dir.join(&config.source.version_file);
    let file = match load_version_file(&path).await {
        Ok(file) => Some(file),
        Err(SourceError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No VERSION file");
            None
        }
        Err(e) => return Err(e),
    };

    let describe = if config.source.use_git {
        describe_repository(base_dir).await
    } else {
        None
    };
    if let Some(d) = &describe {
        debug!(
            describe = %d.build_identifier,
            commits_since_tag = d.commits_since_tag,
            dirty = d.dirty,
            "git describe"
        );
    }

    let descriptor = combine(
        file.as_ref(),
        describe.as_ref(),
        &config.version,
        UNKNOWN_BUILD,
    )?;
    info!(
        version = %descriptor,
        build = descriptor.build_identifier(),
        "Resolved version"
    );
    Ok(descriptor)
}
