//! Configuration management for valutadash.
//!
//! Configuration loading and validation using figment, supporting TOML
//! config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::FileFlagPersistence;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "valutadash";

/// Default location of the production flag-table artifact.
const PRODUCTION_TABLE_PATH: &str = "config/production-flags.json";

/// The running environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local work: everything enabled by default.
    #[default]
    Development,
    /// The live baseline promoted by the stage deployer.
    Production,
}

impl Environment {
    /// Detect the environment from `VALUTADASH_ENV`.
    ///
    /// Only the value `production` selects production; anything else,
    /// including an unset variable, is development.
    #[must_use]
    pub fn detect() -> Self {
        match std::env::var("VALUTADASH_ENV") {
            Ok(value) if value.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// Whether this is the production environment.
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `VALUTADASH_`)
/// 2. TOML config file at `~/.config/valutadash/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment override; detected from `VALUTADASH_ENV` when unset.
    pub environment: Option<Environment>,
    /// Flag-system configuration.
    pub flags: FlagsConfig,
    /// Data service configuration.
    pub data: DataConfig,
    /// Stage deployer configuration.
    pub deploy: DeployConfig,
}

/// Flag-system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Path to the production flag-table artifact.
    pub production_table: PathBuf,
    /// Override for the persisted flag file location.
    /// Defaults to `~/.local/share/valutadash/featureFlags.json`.
    pub persistence_path: Option<PathBuf>,
}

/// Data service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Read from the live source instead of the embedded sample dataset.
    /// Only takes effect while the Google Sheets capability is enabled.
    pub use_live_source: bool,
    /// Base location of the live source's collection exports.
    pub endpoint: Option<String>,
    /// Interval between background refreshes in minutes.
    pub polling_interval_minutes: u64,
}

/// Stage deployer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Command that builds the application.
    pub build_command: Vec<String>,
    /// Command that publishes the built application. Must be configured
    /// before `--deploy` can run.
    pub publish_command: Vec<String>,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            production_table: PathBuf::from(PRODUCTION_TABLE_PATH),
            persistence_path: None, // Resolved to the per-user default at runtime
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            use_live_source: false,
            endpoint: None,
            polling_interval_minutes: 5,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            build_command: vec![
                "cargo".to_string(),
                "build".to_string(),
                "--release".to_string(),
            ],
            publish_command: Vec::new(), // No safe universal default
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("VALUTADASH_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.data.polling_interval_minutes == 0 {
            return Err(Error::config_validation(
                "polling_interval_minutes must be greater than 0",
            ));
        }

        if self.data.use_live_source && self.data.endpoint.is_none() {
            return Err(Error::config_validation(
                "use_live_source requires an endpoint",
            ));
        }

        if self.deploy.build_command.is_empty() {
            return Err(Error::config_validation("build_command must not be empty"));
        }

        Ok(())
    }

    /// The effective environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment.unwrap_or_else(Environment::detect)
    }

    /// Path to the production flag-table artifact.
    #[must_use]
    pub fn production_table_path(&self) -> PathBuf {
        self.flags.production_table.clone()
    }

    /// Path for the persisted flag set, resolving the default if not set.
    #[must_use]
    pub fn persistence_path(&self) -> PathBuf {
        self.flags
            .persistence_path
            .clone()
            .unwrap_or_else(FileFlagPersistence::default_path)
    }

    /// Get the polling interval as a Duration.
    #[must_use]
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.data.polling_interval_minutes * 60)
    }

    /// The running application version: the deploy stamp when present,
    /// otherwise the crate version.
    #[must_use]
    pub fn app_version() -> String {
        std::env::var("VALUTADASH_APP_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string())
    }
}
