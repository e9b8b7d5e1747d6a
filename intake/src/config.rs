//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` and can be changed with the `-f` flag or the `INTAKE_CONFIG`
//! environment variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `INTAKE_` override YAML values
//!
//! Nested values use double underscores, e.g. `INTAKE_STORAGE__DATA_DIR=/var/lib/intake`.
//!
//! ## Example
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 5001
//! static_dir: public
//! storage:
//!   data_dir: /var/lib/intake
//!   uploads_dir: /var/lib/intake/uploads
//! telegram:
//!   timeout: 5s
//! limits:
//!   max_body_size: 20971520
//! ```
//!
//! The Telegram bot token and chat id are not part of this file. They are runtime settings
//! stored under `storage.data_dir` and changed through the API.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "INTAKE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory served for every path outside `/api`
    pub static_dir: PathBuf,
    pub storage: StorageConfig,
    pub telegram: TelegramConfig,
    pub limits: LimitsConfig,
    /// Answer CORS preflights and allow any origin
    pub enable_cors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            static_dir: PathBuf::from("public"),
            storage: StorageConfig::default(),
            telegram: TelegramConfig::default(),
            limits: LimitsConfig::default(),
            enable_cors: true,
        }
    }
}

/// Where submissions, settings and uploads live on disk.
///
/// File names are relative to `data_dir`; `uploads_dir` is used as given.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Diagnosis collection file name
    pub diagnoses_file: String,
    /// Lead collection file name
    pub leads_file: String,
    /// Notification settings file name
    pub settings_file: String,
    pub uploads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            diagnoses_file: "data.json".to_string(),
            leads_file: "lead-data.json".to_string(),
            settings_file: "notification-settings.json".to_string(),
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

impl StorageConfig {
    pub fn diagnoses_path(&self) -> PathBuf {
        self.data_dir.join(&self.diagnoses_file)
    }

    pub fn leads_path(&self) -> PathBuf {
        self.data_dir.join(&self.leads_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }
}

/// Telegram Bot API client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API base URL; overridden in tests
    pub api_base: Url,
    /// Timeout for a single `sendMessage` call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://api.telegram.org").expect("valid default URL"),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes, multipart uploads included. Default: 50MB
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if self.port == 0 {
            return Err(Error::Internal {
                operation: "Config validation: port must be non-zero".to_string(),
            });
        }

        if self.limits.max_body_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.max_body_size must be greater than 0".to_string(),
            });
        }

        if self.telegram.timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: telegram.timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values. INTAKE_CONFIG names the file
            // itself and is not a setting.
            .merge(Env::prefixed("INTAKE_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
