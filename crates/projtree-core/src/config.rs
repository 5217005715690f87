//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for directory scans.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Descend into symbolic links to directories.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,

    /// Include hidden entries (starting with .).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Maximum directory depth below the root (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Glob patterns matched against entry names.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref patterns) = self.ignore_patterns {
            for pattern in patterns {
                Glob::new(pattern).map_err(|e| format!("Invalid ignore pattern {pattern:?}: {e}"))?;
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: true,
            include_hidden: false,
            max_depth: None,
            ignore_patterns: Vec::new(),
        }
    }

    /// Compile the ignore patterns into a matcher.
    pub fn ignore_matcher(&self) -> Result<GlobSet, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("Invalid ignore pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
