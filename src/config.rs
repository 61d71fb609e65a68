//! Configuration file handling for vendor-spend.
//!
//! The configuration file defaults to `<config dir>/vendor-spend/config.json` and holds the
//! positional ledger layout. A missing file is not an error; the built-in layout is used instead.

use crate::error::{ErrorType, IntoResult};
use crate::model::Layout;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

const APP_NAME: &str = "vendor-spend";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. It remembers where it was loaded
/// from so that it can be saved back to the same place.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Writes a default configuration file at `path`, creating its parent directory.
    ///
    /// # Errors
    /// - Returns an error if a file already exists at `path` and `force` is false.
    /// - Returns an error if any file operations fail.
    pub async fn create(path: impl Into<PathBuf>, force: bool) -> Result<Self> {
        let path = path.into();
        if path.exists() && !force {
            bail!(
                "A config file already exists at '{}', use --force to overwrite it",
                path.display()
            )
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent)
                .await
                .context("Unable to create the config directory")?;
        }
        let config = Self {
            path,
            config_file: ConfigFile::default(),
        };
        config.save().await?;
        Ok(config)
    }

    /// Loads the configuration file at `path`. If there is no file there, the defaults are used.
    ///
    /// # Errors
    /// - Returns a `Config` error if the file exists but cannot be read, parsed or validated.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config_file = if path.is_file() {
            ConfigFile::load(&path)
                .await
                .with_context(|| format!("Unable to load the config file '{}'", path.display()))
                .pub_result(ErrorType::Config)?
        } else {
            debug!(
                "No config file at '{}', using the default layout",
                path.display()
            );
            ConfigFile::default()
        };
        Ok(Self { path, config_file })
    }

    /// Saves the configuration to the path it was loaded from or created at.
    pub async fn save(&self) -> Result<()> {
        self.config_file.save(&self.path).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &Layout {
        &self.config_file.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.config_file.layout = layout;
    }

    /// The default location of the config file: `<config dir>/vendor-spend/config.json`.
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join(APP_NAME).join(CONFIG_JSON),
            None => {
                error!(
                    "Unable to find your configuration directory. Provide --config or \
                    VENDOR_SPEND_CONFIG to choose where the config file lives."
                );
                PathBuf::from(CONFIG_JSON)
            }
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "vendor-spend",
///   "config_version": 1,
///   "layout": {
///     "version": 1,
///     "header_offset": 4,
///     "min_cells": 14,
///     "active_marker": "No",
///     "columns": { "id": 0, "caja": 1, "...": 2, "cancelado": 13 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "vendor-spend"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The positional layout of ledger rows
    #[serde(default)]
    layout: Layout,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            layout: Layout::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: &Path) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LedgerColumn;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path().join("nope.json")).await.unwrap();
        assert_eq!(config.layout(), &Layout::default());
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_JSON);
        Config::create(&path, false).await.unwrap();
        assert!(path.is_file());
        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded.layout(), &Layout::default());
    }

    #[tokio::test]
    async fn test_create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        Config::create(&path, false).await.unwrap();
        let err = Config::create(&path, false).await.unwrap_err();
        assert!(err.to_string().contains("--force"), "{err}");
        Config::create(&path, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_layout_is_saved_and_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let mut config = Config::create(&path, false).await.unwrap();
        let columns = LedgerColumn::ALL.iter().copied().zip(0..);
        config.set_layout(Layout::new(2, 14, "N", columns).unwrap());
        config.save().await.unwrap();

        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded.layout().header_offset(), 2);
        assert_eq!(loaded.layout().active_marker(), "N");
    }

    #[tokio::test]
    async fn test_missing_layout_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        std::fs::write(&path, r#"{"app_name": "vendor-spend", "config_version": 1}"#).unwrap();
        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded.layout(), &Layout::default());
    }

    #[tokio::test]
    async fn test_wrong_app_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        std::fs::write(&path, r#"{"app_name": "other-app", "config_version": 1}"#).unwrap();
        let err = Config::load(&path).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Config));
        assert!(format!("{err:#}").contains("Invalid app_name"), "{err:#}");
    }

    #[tokio::test]
    async fn test_invalid_layout_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let mut value = serde_json::to_value(ConfigFile::default()).unwrap();
        value["layout"]["columns"]["cancelado"] = serde_json::json!(0);
        std::fs::write(&path, value.to_string()).unwrap();
        let err = Config::load(&path).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Config));
        assert!(format!("{err:#}").contains("cell index 0"), "{err:#}");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Config));
        assert!(format!("{err:#}").contains("Unable to load the config file"), "{err:#}");
    }
}
