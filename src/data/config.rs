//! Application Configuration
//!
//! Handles loading and saving application configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_HOST;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub floating_toolbar: FloatingToolbarConfig,
}

impl AppConfig {
    fn exe_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::exe_dir().join("config.toml")
    }

    /// Get the key-value store file path. An empty file name disables persistence.
    pub fn storage_path(&self) -> Option<PathBuf> {
        let file = self.general.storage_file.trim();
        if file.is_empty() {
            None
        } else {
            Some(Self::exe_dir().join(file))
        }
    }

    /// Load configuration from file or create default
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::config_path())
    }

    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = AppConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_storage_file")]
    pub storage_file: String,
}

fn default_storage_file() -> String {
    "storage.json".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            storage_file: default_storage_file(),
        }
    }
}

/// Server connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Host offered by the dialog when none is stored
    #[serde(default = "default_host")]
    pub default_host: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Floating favorites toolbar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingToolbarConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Viewport used by the headless overlay host
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    /// Favorite drawing tool ids, in display order
    #[serde(default = "default_favorites")]
    pub favorites: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_viewport_width() -> f64 {
    1920.0
}

fn default_viewport_height() -> f64 {
    1080.0
}

fn default_favorites() -> Vec<String> {
    ["trendline", "horizontal_line", "fib_retracement", "rectangle"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for FloatingToolbarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            favorites: default_favorites(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_file_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_or_default_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.connection.default_host, "http://127.0.0.1:5000");
        assert_eq!(config.general.storage_file, "storage.json");
        assert!(config.floating_toolbar.enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[floating_toolbar]\nfavorites = [\"text\"]\nviewport_width = 1280.0\n",
        )
        .unwrap();

        let config = AppConfig::load_or_default_from(&path).unwrap();
        assert_eq!(config.floating_toolbar.favorites, vec!["text".to_string()]);
        assert_eq!(config.floating_toolbar.viewport_width, 1280.0);
        assert_eq!(config.floating_toolbar.viewport_height, 1080.0);
        assert_eq!(config.connection.request_timeout_secs, 15);
    }

    #[test]
    fn empty_storage_file_disables_persistence() {
        let mut config = AppConfig::default();
        assert!(config.storage_path().unwrap().ends_with("storage.json"));

        config.general.storage_file = "  ".to_string();
        assert!(config.storage_path().is_none());
    }
}
