//! Frontend configuration.
//!
//! All sections have defaults, so a TOML file only needs the values it
//! overrides:
//!
//! ```toml
//! [feature_cache]
//! capacity = 256
//! masked_loads = true
//!
//! [pyramid]
//! levels = 8
//! scale_factor = 1.2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracking::frame::FeatureGrid;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to serialize TOML: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Feature cache parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureCacheParams {
    /// Maximum number of images whose features stay cached (LRU eviction).
    pub capacity: usize,
    /// Apply the stored per-point mask when attaching cached features.
    pub masked_loads: bool,
}

impl Default for FeatureCacheParams {
    fn default() -> Self {
        Self {
            capacity: 512,
            masked_loads: true,
        }
    }
}

/// Image pyramid parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidParams {
    /// Number of levels including the full-resolution image.
    pub levels: usize,
    /// Downscale factor between consecutive levels.
    pub scale_factor: f64,
}

impl Default for PyramidParams {
    fn default() -> Self {
        Self {
            levels: 1,
            scale_factor: 1.2,
        }
    }
}

/// Feature grid parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub cols: usize,
    pub rows: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cols: FeatureGrid::DEFAULT_COLS,
            rows: FeatureGrid::DEFAULT_ROWS,
        }
    }
}

/// Main frontend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub feature_cache: FeatureCacheParams,
    pub pyramid: PyramidParams,
    pub grid: GridParams,
}

impl FrontendConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FrontendConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pyramid.levels == 0 {
            return Err(ConfigError::Invalid("pyramid.levels must be >= 1".into()));
        }
        if self.pyramid.scale_factor.is_nan() || self.pyramid.scale_factor <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "pyramid.scale_factor must be > 1.0, got {}",
                self.pyramid.scale_factor
            )));
        }
        if self.grid.cols == 0 || self.grid.rows == 0 {
            return Err(ConfigError::Invalid("grid dimensions must be non-zero".into()));
        }
        Ok(())
    }
}
