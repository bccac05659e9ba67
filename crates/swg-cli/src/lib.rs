//! # swg-cli: Command Line for swg
//!
//! Provides the `swg` binary.
//!
//! ## Subcommands
//!
//! - `swg validate`: load a document, run the scan pipeline and list
//!   diagnostics and schema cycles.
//! - `swg produce`: produce a typed value from raw JSON against a schema
//!   of a document and print it back as JSON.
//!
//! ```bash
//! swg validate api.yaml
//! swg --config swg.yaml validate api.yaml --no-cycles
//! swg produce api.yaml '#/definitions/Pet' --value '{"name": "Tom"}'
//! ```
//!
//! Exit codes: 0 on success, 1 on diagnostics, invalid values or any error.

pub mod produce;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use swg_scan::ScanConfig;

/// Absolute form of `path`, relative paths taken from the current
/// directory.
pub fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// The scan configuration at `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => {
            let resolved = resolve_path(path);
            ScanConfig::load(&resolved)
                .with_context(|| format!("failed to load config {}", resolved.display()))
        }
        None => Ok(ScanConfig::default()),
    }
}
