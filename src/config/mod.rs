use crate::constants::{LOG_FILE_NAME, env_vars, storage};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_default_database_path, get_log_dir_path};
use validation::validate_config;

/// Configuration structure for the application.
/// Handles loading, saving, and managing application settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to the schedule cache database. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Path to the log file. If not specified, logs will be written to a default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// How long a writer waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout() -> u64 {
    storage::DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            log_file_path: None,
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    /// A missing file yields defaults. Environment variables override
    /// config file values.
    ///
    /// # Environment Variables
    /// - `SEASON_CALENDAR_DATABASE` - Override database path
    /// - `SEASON_CALENDAR_LOG_FILE` - Override log file path
    /// - `SEASON_CALENDAR_BUSY_TIMEOUT_MS` - Override busy timeout (default: 5000)
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            Self::load_from_path(&config_path).await?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Applies environment variable overrides in place
    pub fn apply_env_overrides(&mut self) {
        if let Ok(database_path) = std::env::var(env_vars::DATABASE) {
            self.database_path = Some(database_path);
        }

        if let Ok(log_file_path) = std::env::var(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }

        if let Some(timeout) = std::env::var(env_vars::BUSY_TIMEOUT_MS)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.busy_timeout_ms = timeout;
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(&self.database_path, &self.log_file_path, self.busy_timeout_ms)
    }

    /// Database path to open: the configured one or the platform default
    pub fn resolved_database_path(&self) -> String {
        self.database_path
            .clone()
            .unwrap_or_else(get_default_database_path)
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();
        let config = Config::load().await?;

        println!("\nCurrent Configuration");
        println!("────────────────────────────────────");
        println!("Config Location:");
        if Path::new(&config_path).exists() {
            println!("{config_path}");
        } else {
            println!("{config_path}");
            println!("(Not created yet, using defaults)");
        }
        println!("────────────────────────────────────");
        println!("Schedule Database:");
        println!("{}", config.resolved_database_path());
        if config.database_path.is_none() {
            println!("(Default location)");
        }
        println!("────────────────────────────────────");
        println!("Busy Timeout:");
        println!("{} ms", config.busy_timeout_ms);
        println!("────────────────────────────────────");
        println!("Log File Location:");
        if let Some(custom_path) = &config.log_file_path {
            println!("{custom_path}");
        } else {
            println!("{log_dir}/{LOG_FILE_NAME}");
            println!("(Default location)");
        }

        Ok(())
    }

    /// Saves configuration to a custom file path.
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If there's an I/O error creating directories or writing the file
    /// * `AppError::TomlSerialize` - If there's an error serializing the configuration
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
