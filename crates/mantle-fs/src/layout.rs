//! Environment root layout
//!
//! Maps the well-known relative locations (fragment directories, the
//! secrets and settings documents, persisted run state) onto an
//! environment root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fragments::{DEFAULT_EXTENSIONS, FragmentFilter};

/// Relative locations of the files an environment root carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Ordered base + overlay fragments for the deployment manifest
    pub operations_dir: PathBuf,
    /// Optional cloud-config fragments
    pub cloud_config_dir: PathBuf,
    /// Optional runtime-config fragments
    pub runtime_config_dir: PathBuf,
    /// Optional key/value documents
    pub variables_dir: PathBuf,
    /// Dedicated secrets document
    pub secrets_file: PathBuf,
    /// Dedicated general-settings document
    pub settings_file: PathBuf,
    /// Deployment state document handed to the director
    pub state_file: PathBuf,
    /// Vars-store document handed to the director
    pub vars_store: PathBuf,
    /// Extensions recognised as fragments
    pub extensions: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            operations_dir: PathBuf::from("operations"),
            cloud_config_dir: PathBuf::from("cloud-config"),
            runtime_config_dir: PathBuf::from("runtime-config"),
            variables_dir: PathBuf::from("variables"),
            secrets_file: PathBuf::from("state/creds.yml"),
            settings_file: PathBuf::from("vars.yml"),
            state_file: PathBuf::from("state/state.json"),
            vars_store: PathBuf::from("state/creds.yml"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// A [`LayoutConfig`] anchored at an environment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLayout {
    root: PathBuf,
    config: LayoutConfig,
}

impl EnvironmentLayout {
    pub fn new(root: impl Into<PathBuf>, config: LayoutConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Layout with default locations.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, LayoutConfig::default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn operations_dir(&self) -> PathBuf {
        self.root.join(&self.config.operations_dir)
    }

    pub fn cloud_config_dir(&self) -> PathBuf {
        self.root.join(&self.config.cloud_config_dir)
    }

    pub fn runtime_config_dir(&self) -> PathBuf {
        self.root.join(&self.config.runtime_config_dir)
    }

    pub fn variables_dir(&self) -> PathBuf {
        self.root.join(&self.config.variables_dir)
    }

    pub fn secrets_file(&self) -> PathBuf {
        self.root.join(&self.config.secrets_file)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(&self.config.settings_file)
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join(&self.config.state_file)
    }

    pub fn vars_store(&self) -> PathBuf {
        self.root.join(&self.config.vars_store)
    }

    /// The explicitly configured variable documents, in precedence order.
    pub fn configured_sources(&self) -> [PathBuf; 2] {
        [self.secrets_file(), self.settings_file()]
    }

    pub fn fragment_filter(&self) -> FragmentFilter {
        FragmentFilter::with_extensions(&self.config.extensions)
    }
}
