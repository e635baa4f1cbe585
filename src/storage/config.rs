//! JSON Configuration Management
//!
//! Handles reading and writing the analysis configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{AnalysisSettings, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_clausewise_dir};

/// Configuration service for managing analysis settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AnalysisSettings,
}

impl ConfigService {
    /// Create a new config service, loading existing config or creating defaults
    pub fn new() -> AppResult<Self> {
        ensure_clausewise_dir()?;
        Self::open(config_path()?)
    }

    /// Open the config at `path`, writing defaults when the file is missing
    pub fn open(config_path: PathBuf) -> AppResult<Self> {
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AnalysisSettings::default();
            Self::save_to_file(&config_path, &default_config)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AnalysisSettings> {
        let content = fs::read_to_string(path)?;
        let config: AnalysisSettings = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AnalysisSettings) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AnalysisSettings {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> AnalysisSettings {
        self.config.clone()
    }

    /// Update the configuration with a partial update
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<AnalysisSettings> {
        let mut next = self.config.clone();
        next.apply_update(update);
        Self::save_to_file(&self.config_path, &next)?;
        self.config = next;
        Ok(self.config.clone())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AnalysisSettings::default();
        self.save()?;
        Ok(())
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            config: AnalysisSettings::default(),
        }
    }
}
