//! Selection configuration
//!
//! Settings are stored as RON and every field falls back to its default
//! when absent, so partial files stay valid across versions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolve::ResolveMode;

/// Largest number of decimals shown for preselection coordinates
pub const MAX_COORDINATE_DECIMALS: usize = 6;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Selection system settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Capacity of each history stack
    pub stack_size: usize,
    /// Resolve mode for gates installed without an explicit one
    pub gate_resolve: ResolveMode,
    /// Coordinates smaller than this are shown as zero
    pub preselect_precision: f64,
    /// Decimals shown for preselection coordinates
    pub coordinate_decimals: usize,
    /// Whether the picked list starts enabled
    pub need_picked_list: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            stack_size: 100,
            gate_resolve: ResolveMode::OldStyleElement,
            preselect_precision: 0.0,
            coordinate_decimals: 2,
            need_picked_list: false,
        }
    }
}

impl SelectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimals to display, clamped to [`MAX_COORDINATE_DECIMALS`]
    pub fn decimals(&self) -> usize {
        self.coordinate_decimals.min(MAX_COORDINATE_DECIMALS)
    }

    /// Parse from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Serialize to a pretty RON string
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}
