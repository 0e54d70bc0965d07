#![deny(unsafe_code)]

//! Configuration loading and validation for verstamp.
//!
//! Loads TOML configuration files and validates them. [`AppConfig`] is the
//! central configuration structure: where the version comes from, which
//! components to override, and how the C header is emitted.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the version tuple is read from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Per-component overrides applied on top of the source.
    #[serde(default)]
    pub version: VersionOverrideConfig,

    /// C header emission options.
    #[serde(default)]
    pub header: HeaderConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Version source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path of the `VERSION` file, relative to the project directory.
    #[serde(default = "default_version_file")]
    pub version_file: String,

    /// Whether to ask `git describe` for the build identifier (and for the
    /// version, when no `VERSION` file exists).
    #[serde(default = "default_use_git")]
    pub use_git: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            version_file: default_version_file(),
            use_git: default_use_git(),
        }
    }
}

fn default_version_file() -> String {
    "VERSION".to_string()
}

fn default_use_git() -> bool {
    true
}

/// User-supplied version overrides.
///
/// Each field replaces the corresponding value from the version source.
/// Range checks happen when the descriptor is built, not here.
///
/// ## TOML Example
///
/// ```toml
/// [version]
/// tweak = 4
/// build_identifier = "c52f58c3db14"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOverrideConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_identifier: Option<String>,
}

/// C header emission options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Macro name prefix (`APP` yields `APP_VERSION_MAJOR`, ...).
    #[serde(default = "default_header_prefix")]
    pub prefix: String,

    /// Include guard macro.
    #[serde(default = "default_header_guard")]
    pub guard: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            prefix: default_header_prefix(),
            guard: default_header_guard(),
        }
    }
}

fn default_header_prefix() -> String {
    "APP".to_string()
}

fn default_header_guard() -> String {
    "_APP_VERSION_H_".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Whether `s` is a valid C identifier.
pub fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.version_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source.version_file must not be empty".to_string(),
            ));
        }

        if let Some(id) = &self.version.build_identifier {
            if id.is_empty() {
                return Err(ConfigError::Validation(
                    "version.build_identifier must not be empty".to_string(),
                ));
            }
            if id.chars().any(char::is_whitespace) {
                return Err(ConfigError::Validation(format!(
                    "version.build_identifier must not contain whitespace, got {id:?}"
                )));
            }
        }

        if !is_c_identifier(&self.header.prefix) {
            return Err(ConfigError::Validation(format!(
                "header.prefix must be a C identifier, got {:?}",
                self.header.prefix
            )));
        }
        if !is_c_identifier(&self.header.guard) {
            return Err(ConfigError::Validation(format!(
                "header.guard must be a C identifier, got {:?}",
                self.header.guard
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.source.version_file, "VERSION");
        assert!(config.source.use_git);
        assert_eq!(config.version, VersionOverrideConfig::default());
        assert_eq!(config.header.prefix, "APP");
        assert_eq!(config.header.guard, "_APP_VERSION_H_");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.source.version_file, "VERSION");
        assert_eq!(config.version.major, None);
        assert_eq!(config.version.build_identifier, None);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [source]
            version_file = "app/VERSION"
            use_git = false

            [version]
            major = 3
            minor = 1
            patch = 1
            build_identifier = "c52f58c3db14"

            [header]
            prefix = "FW"
            guard = "FW_VERSION_H"

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.source.version_file, "app/VERSION");
        assert!(!config.source.use_git);
        assert_eq!(config.version.major, Some(3));
        assert_eq!(config.version.tweak, None);
        assert_eq!(config.version.patch, Some(1));
        assert_eq!(
            config.version.build_identifier.as_deref(),
            Some("c52f58c3db14")
        );
        assert_eq!(config.header.prefix, "FW");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_out_of_range_override_is_left_to_descriptor() {
        let toml = r#"
            [version]
            patch = 300
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.version.patch, Some(300));
    }

    #[test]
    fn test_validation_rejects_empty_version_file() {
        let toml = r#"
            [source]
            version_file = "  "
        "#;
        assert!(matches!(
            AppConfig::parse(toml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_bad_build_identifier() {
        for id in ["", "abc def"] {
            let toml = format!("[version]\nbuild_identifier = {id:?}\n");
            assert!(AppConfig::parse(&toml).is_err(), "accepted {id:?}");
        }
    }

    #[test]
    fn test_validation_rejects_bad_header_names() {
        let bad_prefix = r#"
            [header]
            prefix = "9APP"
        "#;
        assert!(AppConfig::parse(bad_prefix).is_err());

        let bad_guard = r#"
            [header]
            guard = "APP-VERSION"
        "#;
        assert!(AppConfig::parse(bad_guard).is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_log_level() {
        let toml = r#"
            [logging]
            level = "loud"
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_negative_component_is_a_parse_error() {
        let toml = r#"
            [version]
            major = -1
        "#;
        assert!(matches!(AppConfig::parse(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_c_identifier() {
        assert!(is_c_identifier("APP"));
        assert!(is_c_identifier("_APP_VERSION_H_"));
        assert!(is_c_identifier("fw2"));
        assert!(!is_c_identifier(""));
        assert!(!is_c_identifier("2fw"));
        assert!(!is_c_identifier("A B"));
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = AppConfig::default();
        config.version.tweak = Some(7);
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&serialized).unwrap();
        assert_eq!(parsed.version.tweak, Some(7));
        assert_eq!(parsed.header.prefix, "APP");
    }

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("verstamp.toml");
        tokio::fs::write(&path, "[version]\ntweak = 2\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.version.tweak, Some(2));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = AppConfig::load(&dir.path().join("absent.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
