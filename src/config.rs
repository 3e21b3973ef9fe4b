//! Configuration for the parsers

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Parser configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Requirements/constraints file handling
    pub requirements: RequirementsConfig,
    /// Lock file handling
    pub lockfile: LockfileConfig,
}

/// Requirements parser configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequirementsConfig {
    /// Match duplicate names and constraint pins exactly. When false, names
    /// are compared after PEP 503 normalization.
    pub case_sensitive_names: bool,
    /// Resolve `-c` constraints directives
    pub follow_constraints: bool,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            case_sensitive_names: true,
            follow_constraints: true,
        }
    }
}

/// Lock parser configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LockfileConfig {
    /// Only emit artifacts used in one of these configurations (all when unset)
    pub configurations: Option<Vec<String>>,
}

impl Config {
    /// Parse configuration from a JSON value, falling back to defaults
    pub fn from_options(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::debug!("Ignoring invalid configuration: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load a `.toml` or `.json` configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config {}", path.display()))
        }
    }
}
