#![deny(unsafe_code)]

//! verstamp core: the application version descriptor.
//!
//! A [`VersionDescriptor`] is built once, from a `VERSION` file, a git tag,
//! or configured overrides, and then shared by reference. It derives the
//! packed numeric codes and display strings that logging, peer version
//! checks, and the generated C header consume.

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Version descriptor, packed codes, and display strings.
pub mod descriptor;
/// C header rendering and writing.
pub mod header;
/// Skew detection between two versions.
pub mod skew;
/// `VERSION` files, version strings, `git describe`, and resolution.
pub mod source;

pub use descriptor::{Component, VersionDescriptor, VersionError};
pub use header::{HeaderError, HeaderOptions};
pub use skew::Skew;
pub use source::{SourceError, resolve};
