//! Extractor configuration loaded from `py-entities.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

pub const CONFIG_FILENAME: &str = "py-entities.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Name compared on the left side of the entry-point guard.
    pub entry_guard_token: String,
    /// String constant the guard is compared against. Matched literally.
    pub entry_guard_literal: String,
    /// Methods whose bodies define instance attributes.
    pub constructor_names: Vec<String>,
    pub self_name: String,
    /// Glob patterns (relative to the source root) skipped by the walker.
    pub exclude: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            entry_guard_token: "__name__".to_string(),
            entry_guard_literal: "main".to_string(),
            constructor_names: vec!["__init__".to_string(), "__new__".to_string()],
            self_name: "self".to_string(),
            exclude: Vec::new(),
        }
    }
}

impl ExtractorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e: toml::de::Error| ExtractError::Config(format!("Invalid {}: {}", CONFIG_FILENAME, e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Loads `py-entities.toml` from `root` when present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self> {
        let candidate = root.join(CONFIG_FILENAME);
        if candidate.is_file() {
            tracing::debug!("Loading config from {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn is_constructor(&self, name: &str) -> bool {
        self.constructor_names.iter().any(|c| c == name)
    }

    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>> {
        self.exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| ExtractError::Config(format!("Invalid exclude pattern '{}': {}", p, e)))
            })
            .collect()
    }
}
