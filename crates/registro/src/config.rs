//! Context configuration.

use crate::result::{RegistroError, RegistroResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default base directory for artifacts
pub const DEFAULT_ARTIFACTS_ROOT: &str = "target/artifacts";

/// Default template of a context's artifacts directory
pub const DEFAULT_ARTIFACTS_PATH_TEMPLATE: &str = "{artifacts-root}/{build-start:%Y%m%dT%H%M%S}{test-suite-name-sanitized:/*}{test-name-sanitized:/*}";

/// Configuration for a [`crate::RegistroContext`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Base directory, available as `{artifacts-root}`
    pub artifacts_root: PathBuf,
    /// Template of the artifacts directory, resolved when the context is built
    pub artifacts_path_template: String,
    /// Initial explicit variables
    pub variables: BTreeMap<String, String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            artifacts_root: PathBuf::from(DEFAULT_ARTIFACTS_ROOT),
            artifacts_path_template: DEFAULT_ARTIFACTS_PATH_TEMPLATE.to_string(),
            variables: BTreeMap::new(),
        }
    }
}

impl ContextConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> RegistroResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> RegistroResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> RegistroResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> RegistroResult<()> {
        if self.artifacts_path_template.trim().is_empty() {
            return Err(RegistroError::config("artifacts_path_template must not be empty"));
        }
        Ok(())
    }

    /// Set artifacts base directory
    #[must_use]
    pub fn with_artifacts_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifacts_root = root.into();
        self
    }

    /// Set artifacts path template
    #[must_use]
    pub fn with_artifacts_path_template(mut self, template: impl Into<String>) -> Self {
        self.artifacts_path_template = template.into();
        self
    }

    /// Add an initial variable
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.variables.insert(key.into(), value.into());
        self
    }
}
