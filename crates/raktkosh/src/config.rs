//! Configuration management for raktkosh.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::blood::Urgency;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "raktkosh";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "raktkosh.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RAKTKOSH_`)
/// 2. TOML config file at `~/.config/raktkosh/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Donor search configuration.
    pub search: SearchConfig,
    /// Donation eligibility rules.
    pub eligibility: EligibilityConfig,
    /// Emergency board configuration.
    pub emergency: EmergencyConfig,
    /// Blood stock overview configuration.
    pub stock: StockConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/raktkosh/raktkosh.db`
    pub database_path: Option<PathBuf>,
}

/// Search-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Urgency used when a search does not name one.
    pub default_urgency: Urgency,
}

/// Eligibility rules for donors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Days a registered donor must wait between donations.
    pub donation_interval_days: u32,
    /// Months since last donation before a directory donor can donate again.
    pub donor_cooldown_months: u32,
}

/// Emergency board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// Seed the board with sample requests the first time it is loaded.
    pub seed_samples: bool,
}

/// Blood stock overview configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    /// Units below which a group is reported as low.
    pub low_stock_threshold: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            donation_interval_days: 90,
            donor_cooldown_months: 3,
        }
    }
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self { seed_samples: true }
    }
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `RAKTKOSH_`)
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
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("RAKTKOSH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.eligibility.donation_interval_days == 0 {
            return Err(Error::ConfigValidation {
                message: "donation_interval_days must be greater than 0".to_string(),
            });
        }

        if self.stock.low_stock_threshold == 0 {
            return Err(Error::ConfigValidation {
                message: "low_stock_threshold must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the donation interval as a Duration.
    #[must_use]
    pub fn donation_interval(&self) -> Duration {
        Duration::days(i64::from(self.eligibility.donation_interval_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.search.default_urgency, Urgency::Normal);
        assert_eq!(config.eligibility.donation_interval_days, 90);
        assert_eq!(config.eligibility.donor_cooldown_months, 3);
        assert!(config.emergency.seed_samples);
        assert_eq!(config.stock.low_stock_threshold, 10);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_donation_interval() {
        let mut config = Config::default();
        config.eligibility.donation_interval_days = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("donation_interval_days"));
    }

    #[test]
    fn test_validate_zero_stock_threshold() {
        let mut config = Config::default();
        config.stock.low_stock_threshold = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("low_stock_threshold"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("raktkosh.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_donation_interval() {
        let config = Config::default();
        assert_eq!(config.donation_interval(), Duration::days(90));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("raktkosh"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "raktkosh_config_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[search]\ndefault_urgency = \"critical\"\n\n[stock]\nlow_stock_threshold = 5\n\n[eligibility]\ndonation_interval_days = 56\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.search.default_urgency, Urgency::Critical);
        assert_eq!(config.stock.low_stock_threshold, 5);
        assert_eq!(config.eligibility.donation_interval_days, 56);
        assert_eq!(config.eligibility.donor_cooldown_months, 3);
        assert!(config.emergency.seed_samples);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_eligibility_config_deserialize() {
        let json = r#"{"donation_interval_days": 56}"#;
        let eligibility: EligibilityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(eligibility.donation_interval_days, 56);
        assert_eq!(eligibility.donor_cooldown_months, 3);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("low_stock_threshold"));
        assert!(json.contains("\"default_urgency\":\"normal\""));
    }
}
