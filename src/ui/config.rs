//! # Configuration Persistence
//!
//! User settings live in `~/.config/llmviz/config.json` (resolved with the
//! `directories` crate), or in the file given by `--config`.
//!
//! ```json
//! {
//!   "theme": "Nord",
//!   "speed": 1.5,
//!   "menu": {
//!     "modules": ["kv-cache", "speculative-decoding"],
//!     "group_by_category": true
//!   }
//! }
//! ```

use crate::menu::MenuSelection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name of the selected built-in theme.
    #[serde(default = "default_theme_name")]
    pub theme: String,

    /// Playback speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Saved sidebar menu; `None` shows every module in registry order.
    #[serde(default)]
    pub menu: Option<MenuSelection>,
}

fn default_theme_name() -> String {
    "Catppuccin Mocha".to_string()
}

fn default_speed() -> f64 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme_name(),
            speed: default_speed(),
            menu: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// Falls back to `Config::default()` on any error so a broken config
    /// file never prevents startup.
    pub fn load(path: Option<&Path>) -> Self {
        let result = match path {
            Some(path) => Self::load_from(path),
            None => Self::default_path().and_then(|path| Self::load_from(&path)),
        };
        result.unwrap_or_else(|e| {
            warn!(error = %format!("{e:#}"), "using default config");
            Self::default()
        })
    }

    /// Load configuration from a specific path. Returns `Config::default()`
    /// if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), theme = %config.theme, "config loaded");
        Ok(config)
    }

    /// Save to `path`, or to the default location when `None`.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => self.save_to(path),
            None => self.save_to(&Self::default_path()?),
        }
    }

    /// Save the current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        debug!(path = %path.display(), "config saved");

        Ok(())
    }

    /// Path of the default config file.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "llmviz")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, "Catppuccin Mocha");
        assert_eq!(config.speed, 1.0);
        assert!(config.menu.is_none());
    }

    #[test]
    fn test_deserialize_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_menu_without_grouping_flag() {
        let json = r#"{"menu": {"modules": ["a", "b"]}}"#;
        let config: Config = serde_json::from_str(json).expect("deserialize");
        let menu = config.menu.expect("menu");
        assert_eq!(menu.modules, vec!["a", "b"]);
        assert!(!menu.group_by_category);
    }

    #[test]
    fn test_save_to_load_from_roundtrip() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("subdir").join("config.json");

        let config = Config {
            theme: "Dracula".to_string(),
            speed: 2.0,
            menu: Some(MenuSelection {
                modules: vec!["kv-cache".to_string()],
                group_by_category: true,
            }),
        };

        config.save_to(&config_path).expect("save_to");
        let loaded = Config::load_from(&config_path).expect("load_from");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file_returns_default() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("does_not_exist.json");

        let loaded = Config::load_from(&config_path).expect("load_from");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_falls_back_on_garbage() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "not json").expect("write");

        assert!(Config::load_from(&config_path).is_err());
        assert_eq!(Config::load(Some(&config_path)), Config::default());
    }

    #[test]
    fn test_deny_unknown_fields() {
        let json = r#"{"theme": "Nord", "unknown_field": true}"#;
        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err(), "should reject unknown fields");
    }
}
