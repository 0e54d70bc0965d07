//! C header emission.
//!
//! Renders a descriptor as a preprocessor header so firmware and other C
//! consumers see the same values as the Rust side:
//!
//! ```c
//! #define APPVERSION                   0x3010100
//! #define APP_VERSION_NUMBER           0x30101
//! #define APP_VERSION_STRING           "3.1.1"
//! ```

use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info};
use verstamp_config::{HeaderConfig, is_c_identifier};

use crate::descriptor::VersionDescriptor;

/// Macro names are padded to this width before the value.
const NAME_WIDTH: usize = 28;

#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("failed to write header: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid {what}: {value:?}")]
    InvalidName { what: &'static str, value: String },
}

/// Naming options for the generated header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    prefix: String,
    guard: String,
}

impl HeaderOptions {
    pub fn new(prefix: impl Into<String>, guard: impl Into<String>) -> Result<Self, HeaderError> {
        let (prefix, guard) = (prefix.into(), guard.into());
        if !is_c_identifier(&prefix) {
            return Err(HeaderError::InvalidName {
                what: "header prefix",
                value: prefix,
            });
        }
        if !is_c_identifier(&guard) {
            return Err(HeaderError::InvalidName {
                what: "include guard",
                value: guard,
            });
        }
        Ok(Self { prefix, guard })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn guard(&self) -> &str {
        &self.guard
    }
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            prefix: "APP".to_string(),
            guard: "_APP_VERSION_H_".to_string(),
        }
    }
}

impl TryFrom<&HeaderConfig> for HeaderOptions {
    type Error = HeaderError;

    fn try_from(config: &HeaderConfig) -> Result<Self, Self::Error> {
        Self::new(config.prefix.clone(), config.guard.clone())
    }
}

fn define(out: &mut String, name: &str, value: impl std::fmt::Display) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "#define {name:<NAME_WIDTH$} {value}");
}

/// Render the header text for `descriptor`.
///
/// The build identifier is emitted bare, so one containing control
/// characters (line breaks in particular) is rejected rather than allowed
/// to inject preprocessor lines.
pub fn render_header(
    descriptor: &VersionDescriptor,
    options: &HeaderOptions,
) -> Result<String, HeaderError> {
    let build_identifier = descriptor.build_identifier();
    if build_identifier.chars().any(char::is_control) {
        return Err(HeaderError::InvalidName {
            what: "build identifier",
            value: build_identifier.to_string(),
        });
    }

    let p = options.prefix();
    let guard = options.guard();
    let mut out = String::new();

    let _ = writeln!(out, "#ifndef {guard}");
    let _ = writeln!(out, "#define {guard}");
    out.push('\n');
    out.push_str("/* Generated by verstamp. Do not edit. */\n");
    out.push('\n');

    define(&mut out, &format!("{p}VERSION"), format_args!("{:#x}", descriptor.packed_code()));
    define(
        &mut out,
        &format!("{p}_VERSION_NUMBER"),
        format_args!("{:#x}", descriptor.short_numeric_code()),
    );
    define(&mut out, &format!("{p}_VERSION_MAJOR"), descriptor.major());
    define(&mut out, &format!("{p}_VERSION_MINOR"), descriptor.minor());
    define(&mut out, &format!("{p}_PATCHLEVEL"), descriptor.patch());
    define(&mut out, &format!("{p}_TWEAK"), descriptor.tweak());
    define(
        &mut out,
        &format!("{p}_VERSION_STRING"),
        format_args!("\"{}\"", descriptor.display_string()),
    );
    define(
        &mut out,
        &format!("{p}_VERSION_EXTENDED_STRING"),
        format_args!("\"{}\"", descriptor.extended_display_string()),
    );
    define(
        &mut out,
        &format!("{p}_VERSION_TWEAK_STRING"),
        format_args!("\"{}\"", descriptor.tweak_display_string()),
    );
    out.push('\n');

    let build = format!("#define {p}_BUILD_VERSION {build_identifier}");
    out.push_str(build.trim_end());
    out.push_str("\n\n");

    let _ = writeln!(out, "#endif /* {guard} */");
    Ok(out)
}

/// Write the header to `path`, creating parent directories.
///
/// An existing file with identical content is left untouched so its
/// modification time does not trigger rebuilds. Returns whether the file
/// was written.
pub async fn write_header(
    path: &Path,
    descriptor: &VersionDescriptor,
    options: &HeaderOptions,
) -> Result<bool, HeaderError> {
    let content = render_header(descriptor, options)?;

    match tokio::fs::read_to_string(path).await {
        Ok(existing) if existing == content => {
            debug!(path = %path.display(), "Header unchanged");
            return Ok(false);
        }
        _ => {}
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), version = %descriptor, "Wrote version header");
    Ok(true)
}
