//! Flow controller settings, loadable from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where rule-bearing questions are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Ask the routing service; fall back to sequential order if it fails.
    #[default]
    Remote,

    /// Evaluate rules in-process.
    Local,
}

/// Settings for one flow controller.
///
/// ```toml
/// resolution = "remote"
/// resolution_timeout_ms = 3000
/// service_timeout_ms = 5000
/// persist_answers = true
/// remote_progress = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub resolution: ResolutionMode,

    /// Upper bound on one routing service call.
    pub resolution_timeout_ms: u64,

    /// Upper bound on submission and progress service calls.
    pub service_timeout_ms: u64,

    /// Save each answer through the submission service as it is submitted.
    pub persist_answers: bool,

    /// Cross-check local progress against the progress service after each advance.
    pub remote_progress: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::Remote,
            resolution_timeout_ms: 3000,
            service_timeout_ms: 5000,
            persist_answers: true,
            remote_progress: false,
        }
    }
}

impl FlowConfig {
    /// Defaults, but resolving rules in-process.
    pub fn local() -> Self {
        Self {
            resolution: ResolutionMode::Local,
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "loaded flow config");
        Ok(config)
    }

    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution_timeout_ms)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = FlowConfig::from_toml_str("").unwrap();
        assert_eq!(config, FlowConfig::default());
        assert_eq!(config.resolution, ResolutionMode::Remote);
        assert_eq!(config.resolution_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn partial_override() {
        let config = FlowConfig::from_toml_str(
            r#"
            resolution = "local"
            persist_answers = false
            "#,
        )
        .unwrap();
        assert_eq!(config.resolution, ResolutionMode::Local);
        assert!(!config.persist_answers);
        assert_eq!(config.service_timeout_ms, 5000);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = FlowConfig::from_toml_str(r#"resolution = "psychic""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resolution_timeout_ms = 250\nremote_progress = true").unwrap();

        let config = FlowConfig::load(file.path()).unwrap();
        assert_eq!(config.resolution_timeout(), Duration::from_millis(250));
        assert!(config.remote_progress);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FlowConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
