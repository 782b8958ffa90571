//! Configuration schema (imgtree.toml)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error loading the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(String),

    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Registry connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the registry API.
    pub url: String,

    /// Page size for tag listing requests.
    pub page_size: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://registry.hub.docker.com".to_string(),
            page_size: 100,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry namespace all images are published under
    /// (e.g. `mvpstudio` for `mvpstudio/base`).
    pub namespace: String,

    /// Registry connection settings.
    pub registry: RegistryConfig,

    /// Name of the build output directory, created under the project root.
    pub build_dir: String,

    /// Push images after building them.
    pub push: bool,

    /// Build images with no ancestor/descendant relationship concurrently.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "mvpstudio".to_string(),
            registry: RegistryConfig::default(),
            build_dir: "build".to_string(),
            push: true,
            parallel: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Load config from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
