//! Temporary project directories.
//!
//! [`TestProject`] owns a temp directory laid out like a project that
//! verstamp stamps: an optional `VERSION` file and an optional
//! `verstamp.toml`.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// `VERSION` file contents for `3.1.1+0`.
pub const REFERENCE_VERSION_FILE: &str = "\
VERSION_MAJOR = 3
VERSION_MINOR = 1
PATCHLEVEL = 1
VERSION_TWEAK = 0
EXTRAVERSION =
";

/// A test-scoped project directory.
///
/// The temp directory is deleted automatically when this value is dropped,
/// guaranteeing cleanup even on panic.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    /// Create an empty project directory.
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Create a project whose `VERSION` file has the given contents.
    pub async fn with_version_file(content: &str) -> Self {
        let project = Self::empty();
        project.write_file("VERSION", content).await;
        project
    }

    /// Create a project with the `3.1.1+0` reference `VERSION` file.
    pub async fn reference() -> Self {
        Self::with_version_file(REFERENCE_VERSION_FILE).await
    }

    /// Root of the project.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file inside the project.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir().join(relative)
    }

    /// Write (or overwrite) a file inside the project, creating parents.
    pub async fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .expect("failed to create parent dir");
        }
        tokio::fs::write(&path, content)
            .await
            .expect("failed to write test file");
        path
    }

    /// Write a `verstamp.toml` and return its path.
    pub async fn write_config(&self, toml_content: &str) -> PathBuf {
        self.write_file("verstamp.toml", toml_content).await
    }

    /// Run `git` inside the project with a throwaway identity and signing
    /// disabled. Returns `false` when git is missing or the command fails,
    /// so tests can skip on machines without git.
    pub async fn git(&self, args: &[&str]) -> bool {
        tokio::process::Command::new("git")
            .args(["-c", "user.name=verstamp", "-c", "user.email=verstamp@example.com"])
            .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
            .args(args)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .current_dir(self.dir())
            .output()
            .await
            .is_ok_and(|o| o.status.success())
    }

    /// Read a file inside the project.
    pub async fn read_file(&self, relative: &str) -> String {
        tokio::fs::read_to_string(self.path(relative))
            .await
            .expect("failed to read test file")
    }
}
