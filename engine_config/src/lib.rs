//! Configuration management for soundfield.
//!
//! Loads, saves and hands out the engine's render settings as a TOML
//! file. The mixing core never touches the filesystem; this crate sits
//! on the control side.

use engine_core::{Error, RenderSettings};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Manages the persisted render settings.
pub struct ConfigManager {
    settings: RenderSettings,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Create a manager backed by the user's config directory, loading
    /// the file if it exists and falling back to defaults otherwise.
    pub fn new() -> Result<Self, Error> {
        let mut config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Failed to determine config directory".to_string()))?;
        config_dir.push("soundfield");

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let config_file = config_dir.join("render.toml");
        let settings = if config_file.exists() {
            Self::load_from_file(&config_file)?
        } else {
            debug!("Render config not found, using defaults");
            RenderSettings::default()
        };

        Ok(Self {
            settings,
            config_file,
        })
    }

    /// Create a manager with a custom file path (mainly for testing).
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_file = path.as_ref().to_path_buf();
        let settings = if config_file.exists() {
            Self::load_from_file(&config_file)?
        } else {
            RenderSettings::default()
        };

        Ok(Self {
            settings,
            config_file,
        })
    }

    /// Load settings from a TOML file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, Error> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), Error> {
        let toml = toml::to_string_pretty(&self.settings)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.config_file.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        fs::write(&self.config_file, toml)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        debug!("Saved render config to {:?}", self.config_file);
        Ok(())
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    pub fn update_settings(&mut self, new_settings: RenderSettings) {
        self.settings = new_settings;
    }
}
