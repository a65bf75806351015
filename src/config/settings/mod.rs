
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::CatalogConfig;
use crate::recommend::RecommenderConfig;
use crate::recommend::display::DisplayConfig;
use crate::vectorize::VectorizerConfig;

/// Environment variable overriding the default data directory
pub const HOME_ENV_VAR: &str = "CINEVERSE_HOME";

const CONFIG_FILE_NAME: &str = "config.toml";
const MODELS_DIR_NAME: &str = "models";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub recommender: RecommenderConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Data directory not found or could not be determined")]
    DirectoryError,
    #[error("Invalid max features: {0} (must be between 1 and 100000)")]
    InvalidMaxFeatures(usize),
    #[error("Invalid top k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Invalid score multiplier: {0} (must be greater than 0 and at most 10)")]
    InvalidScoreMultiplier(f64),
    #[error("Invalid score ceiling: {0} (must be between 1 and 100)")]
    InvalidScoreCeiling(u8),
    #[error("Invalid highlight threshold: {0} (must be between 0 and 100)")]
    InvalidHighlightThreshold(u8),
    #[error("Invalid search URL: {0} (must be an http or https URL)")]
    InvalidSearchUrl(String),
    #[error("Poster size marker cannot be empty")]
    EmptyPosterMarker,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Resolve the default data directory: `$CINEVERSE_HOME`, then `~/.cineverse`
    #[inline]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(home));
        }

        dirs::home_dir()
            .map(|home| home.join(".cineverse"))
            .or_else(|| dirs::data_dir().map(|data| data.join("cineverse")))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Default settings rooted at `base_dir`
    #[inline]
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::with_base_dir(config_dir));
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        self.vectorizer.validate()?;
        self.recommender.validate()?;
        self.display.validate()?;
        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    /// Directory holding the built index artifacts
    #[inline]
    pub fn models_dir(&self) -> PathBuf {
        self.get_base_dir().join(MODELS_DIR_NAME)
    }
}
