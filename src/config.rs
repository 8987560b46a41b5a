//! Application configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;
use tracing::warn;

use crate::errors::TrailRecorderError;

/// Shortest key the generator may be configured to produce.
pub const MIN_KEY_LENGTH: u8 = 5;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub keys: KeyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Base URL the logging client posts to, written into generated profiles
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout: Duration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KeyConfig {
    #[serde(default = "default_min_length")]
    pub min_length: u8,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_min_length() -> u8 {
    MIN_KEY_LENGTH
}

fn default_max_attempts() -> u32 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_url: default_public_url(),
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        #[cfg(feature = "dotenv")]
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("TRAILRECORDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), TrailRecorderError> {
        self.database.validate()?;
        self.keys.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), TrailRecorderError> {
        self.validate_path()?;
        self.validate_busy_timeout()?;
        if let Some(parent) = self.path.parent() {
            // A bare file name has an empty parent, which means the working directory
            if !parent.as_os_str().is_empty() {
                self.ensure_directory_exists(parent)?;
            }
        }
        Ok(())
    }

    fn validate_path(&self) -> Result<(), TrailRecorderError> {
        if self.path.as_os_str().is_empty() {
            return Err(TrailRecorderError::ConfigurationError {
                message: "Database path cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    fn validate_busy_timeout(&self) -> Result<(), TrailRecorderError> {
        if self.busy_timeout.is_zero() {
            return Err(TrailRecorderError::ConfigurationError {
                message: "Busy timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn ensure_directory_exists(&self, dir: &Path) -> Result<(), TrailRecorderError> {
        if !dir.exists() {
            warn!("Database directory does not exist, attempting to create it");
            std::fs::create_dir_all(dir).map_err(|e| TrailRecorderError::ConfigurationError {
                message: format!("Could not create database directory: {}", e),
            })?;
        }
        Ok(())
    }
}

impl KeyConfig {
    pub fn validate(&self) -> Result<(), TrailRecorderError> {
        if self.min_length < MIN_KEY_LENGTH {
            return Err(TrailRecorderError::ConfigurationError {
                message: format!("Key length must be at least {}", MIN_KEY_LENGTH),
            });
        }
        if self.max_attempts == 0 {
            return Err(TrailRecorderError::ConfigurationError {
                message: "Key generation needs at least one attempt".to_string(),
            });
        }
        Ok(())
    }
}
