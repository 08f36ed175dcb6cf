//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use pocat::Wrapper;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "pocat";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub wrap: WrapConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapConfig {
    /// Column to wrap fields at
    #[serde(default = "default_width")]
    pub width: usize,

    /// Wrap on column at all; otherwise split only at newlines
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Also break around block markup tags
    #[serde(default)]
    pub fine: bool,
}

fn default_width() -> usize {
    80
}

fn default_true() -> bool {
    true
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            enabled: true,
            fine: false,
        }
    }
}

impl WrapConfig {
    /// Field formatter matching these settings
    pub fn wrapper(&self) -> Wrapper {
        let wrapper = if self.enabled {
            Wrapper::new(self.width)
        } else {
            Wrapper::unwrapped()
        };
        wrapper.fine(self.fine)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// File extensions picked up when walking directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Walk directories recursively by default
    #[serde(default)]
    pub recursive: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["po".to_string(), "pot".to_string()]
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            recursive: false,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[wrap]\nfine = true\n").unwrap();
        assert_eq!(config.wrap.width, 80);
        assert!(config.wrap.enabled);
        assert!(config.wrap.fine);
        assert_eq!(config.catalog.extensions, vec!["po", "pot"]);
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.wrap.width = 100;
        config.catalog.recursive = true;
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.wrap.width, 100);
        assert!(back.catalog.recursive);
    }
}
