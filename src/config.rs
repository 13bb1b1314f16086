use std::time::Duration;

use thiserror::Error;

use crate::bridge::DEFAULT_UPLOAD_DIR;
use crate::validation::{
    FileLimits, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_TOTAL_SIZE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub limits: FileLimits,
    pub processing: ProcessingConfig,
    pub storage: StorageConfig,
    /// Exposes the `/_fs` write/delete/list routes. Local development only.
    pub dev_bridge: bool,
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Fixed part of the simulated processing time
    pub delay: Duration,
    /// Upper bound of the random extra time added to `delay`
    pub jitter: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory the dev bridge resolves paths against
    pub root: String,
    /// Subdirectory of `root` that accepted files are saved into
    pub upload_dir: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            upload_dir: DEFAULT_UPLOAD_DIR.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            limits: FileLimits::default(),
            processing: ProcessingConfig::default(),
            storage: StorageConfig::default(),
            dev_bridge: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let limits = FileLimits {
            max_files: env_parse("MAX_FILES").unwrap_or(DEFAULT_MAX_FILES),
            max_file_size: env_parse("MAX_FILE_SIZE").unwrap_or(DEFAULT_MAX_FILE_SIZE),
            max_total_size: env_parse("MAX_TOTAL_SIZE").unwrap_or(DEFAULT_MAX_TOTAL_SIZE),
        };

        let processing = ProcessingConfig {
            delay: Duration::from_millis(env_parse("PROCESSING_DELAY_MS").unwrap_or(1000)),
            jitter: Duration::from_millis(env_parse("PROCESSING_JITTER_MS").unwrap_or(1000)),
        };

        let storage = StorageConfig {
            root: std::env::var("STORAGE_ROOT").unwrap_or_else(|_| ".".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string()),
        };

        let dev_bridge = std::env::var("DEV_BRIDGE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            bind_address,
            limits,
            processing,
            storage,
            dev_bridge,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_FILES must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_FILE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_total_size < self.limits.max_file_size {
            return Err(ConfigError::ValidationError(
                "MAX_TOTAL_SIZE must be at least MAX_FILE_SIZE".to_string(),
            ));
        }

        let upload_dir = self.storage.upload_dir.trim_matches('/');
        if upload_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "UPLOAD_DIR cannot be empty".to_string(),
            ));
        }
        if upload_dir
            .split('/')
            .any(|s| s == ".." || s == "." || s.contains('\\'))
        {
            return Err(ConfigError::ValidationError(format!(
                "UPLOAD_DIR must be a plain relative path, got '{}'",
                self.storage.upload_dir
            )));
        }

        if self.dev_bridge {
            tracing::warn!(
                "DEV_BRIDGE is enabled. /_fs routes can write anywhere under {}",
                self.storage.root
            );
        }

        Ok(())
    }

    /// Largest request body an upload may carry: a full batch at the
    /// per-file cap plus room for multipart framing.
    pub fn upload_body_limit(&self) -> usize {
        let batch = self.limits.max_file_size.saturating_mul(self.limits.max_files as u64);
        usize::try_from(batch.saturating_add(64 * 1024)).unwrap_or(usize::MAX)
    }
}
