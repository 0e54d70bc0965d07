//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use verstamp_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// Git lookups are disabled by default so results do not depend on the
/// repository the tests run in.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .tweak(4)
///     .build_identifier("c52f58c3db14")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.source.use_git = false;
        Self { config }
    }

    pub fn version_file(mut self, path: &str) -> Self {
        self.config.source.version_file = path.to_string();
        self
    }

    pub fn use_git(mut self, enabled: bool) -> Self {
        self.config.source.use_git = enabled;
        self
    }

    pub fn version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.config.version.major = Some(major);
        self.config.version.minor = Some(minor);
        self.config.version.patch = Some(patch);
        self
    }

    pub fn tweak(mut self, tweak: u32) -> Self {
        self.config.version.tweak = Some(tweak);
        self
    }

    pub fn build_identifier(mut self, id: &str) -> Self {
        self.config.version.build_identifier = Some(id.to_string());
        self
    }

    pub fn header_prefix(mut self, prefix: &str) -> Self {
        self.config.header.prefix = prefix.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
