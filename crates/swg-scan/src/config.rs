//! Scan configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no
//! file at all) gives the standard pipeline with both diagnostic passes
//! enabled and nothing fatal about their findings.
//!
//! ```yaml
//! validate: true
//! detect_cycles: true
//! strict: false
//! load_hooks:
//!   "https://schemas.example.com/": "file:///srv/schemas/"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a [`ScanConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to parse config: {0}")]
    YamlParseStr(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Run the diagnostic validation pass.
    pub validate: bool,
    /// Run the diagnostic cycle detection pass.
    pub detect_cycles: bool,
    /// Treat any diagnostic as a hard error after the pipeline finishes.
    pub strict: bool,
    /// Document URL prefix rewrites applied before loading.
    pub load_hooks: BTreeMap<String, String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            validate: true,
            detect_cycles: true,
            strict: false,
            load_hooks: BTreeMap::new(),
        }
    }
}

impl ScanConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
