//! Configuration file handling.
//!
//! The configuration file is stored at `$MINIMARKET_HOME/config.json` and holds the search
//! debounce, the stock thresholds, how long fetched collections stay fresh, and where collection
//! snapshots are read from.

use crate::error::{ErrorType, IntoResult, Res};
use crate::settings::SETTINGS_JSON;
use crate::session::SESSION_JSON;
use crate::view::Thresholds;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "minimarket";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DATA_DIR: &str = "data";
const DEBOUNCE_MS: u64 = 300;
const CACHE_STALE_SECS: u64 = 300;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$MINIMARKET_HOME` and from there it loads `$MINIMARKET_HOME/config.json`. It
/// provides paths to other items that are either configurable or are expected in a certain
/// location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its data directory and an initial `config.json` with default
    /// settings.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail, or if `config.json` already exists.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::create_inner(dir.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the minimarket home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            config_path,
            config_file,
        };
        utils::make_dir(config.data_dir()).await?;
        Ok(config)
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The minimarket home directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where collection snapshots live. Relative paths are resolved against the home directory.
    pub fn data_dir(&self) -> PathBuf {
        let p = &self.config_file.data_dir;
        if p.is_absolute() {
            return p.clone();
        }
        self.root.join(p)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_JSON)
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_JSON)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.config_file.debounce_ms)
    }

    pub fn cache_stale_after(&self) -> Duration {
        Duration::from_secs(self.config_file.cache_stale_secs)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            stock_bajo: self.config_file.stock_bajo_ratio,
            stock_critico: self.config_file.stock_critico_ratio,
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "minimarket",
///   "config_version": 1,
///   "debounce_ms": 300,
///   "stock_bajo_ratio": "1",
///   "stock_critico_ratio": "0.5",
///   "cache_stale_secs": 300,
///   "data_dir": "data"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "minimarket"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// How long search input must be quiet before it filters the list
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,

    /// Stock is low at or below `stock_minimo * stock_bajo_ratio`
    #[serde(default = "default_stock_bajo_ratio")]
    stock_bajo_ratio: Decimal,

    /// Stock is critical at or below `stock_minimo * stock_critico_ratio`
    #[serde(default = "default_stock_critico_ratio")]
    stock_critico_ratio: Decimal,

    /// Seconds a fetched collection is used before it is fetched again
    #[serde(default = "default_cache_stale_secs")]
    cache_stale_secs: u64,

    /// Directory of collection snapshots (relative to the home directory or absolute)
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

fn default_stock_bajo_ratio() -> Decimal {
    Thresholds::default().stock_bajo
}

fn default_stock_critico_ratio() -> Decimal {
    Thresholds::default().stock_critico
}

fn default_cache_stale_secs() -> u64 {
    CACHE_STALE_SECS
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DATA_DIR)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            debounce_ms: default_debounce_ms(),
            stock_bajo_ratio: default_stock_bajo_ratio(),
            stock_critico_ratio: default_stock_critico_ratio(),
            cache_stale_secs: default_cache_stale_secs(),
            data_dir: default_data_dir(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it is not a minimarket config
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            !config.stock_bajo_ratio.is_sign_negative()
                && !config.stock_critico_ratio.is_sign_negative(),
            "Stock ratios cannot be negative"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("minimarket_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.thresholds(), Thresholds::default());
        assert!(config.config_path().is_file());
        assert!(config.data_dir().is_dir());
        assert_eq!(config.session_path(), config.root().join("session.json"));
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        let _ = Config::create(dir.path()).await.unwrap();
        let err = Config::create(dir.path()).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_config_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path()).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.config_file, loaded.config_file);
        assert_eq!(created.root(), loaded.root());
    }

    #[tokio::test]
    async fn test_config_load_missing() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("config file is missing"));
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.stock_critico_ratio, Decimal::new(5, 1));
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            debounce_ms: 150,
            stock_bajo_ratio: Decimal::new(12, 1),
            data_dir: PathBuf::from("/srv/minimarket/data"),
            ..ConfigFile::default()
        };
        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(
            &config_path,
            r#"{"app_name": "minimarket", "config_version": 1, "stock_bajo_ratio": 1.5}"#,
        )
        .await
        .unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.stock_bajo_ratio, Decimal::new(15, 1));
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.cache_stale_secs, 300);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(&config_path, r#"{"app_name": "tienda", "config_version": 1}"#)
            .await
            .unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_absolute_data_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::create(dir.path()).await.unwrap();
        config.config_file.data_dir = PathBuf::from("/var/snapshots");
        assert_eq!(config.data_dir(), PathBuf::from("/var/snapshots"));
    }
}
