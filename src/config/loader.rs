//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

const NAMESPACE_ENV: &str = "RELEASE_SYNC_NAMESPACE";
const LOG_LEVEL_ENV: &str = "RELEASE_SYNC_LOG_LEVEL";
const RETRY_DELAY_ENV: &str = "RELEASE_SYNC_RETRY_RELOAD_DELAY_SECONDS";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Config file (`path`, else `$RELEASE_SYNC_CONFIG`, else the config dir)
    /// 3. Built-in defaults
    ///
    /// An explicit `path` must exist; the implicit locations are optional.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => {
                let path = paths::default_config_path();
                if path.exists() {
                    Self::load_file(&path)?
                } else {
                    debug!("No config file at {}, using defaults", path.display());
                    Self::load_defaults()
                }
            }
        };

        config = Self::apply_env_overrides(config);
        Ok(defaults::fill_zero_values(config))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        if let Ok(namespace) = std::env::var(NAMESPACE_ENV) {
            config.namespace = namespace;
        }

        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            config.logger.level = level;
        }

        if let Ok(delay) = std::env::var(RETRY_DELAY_ENV) {
            match delay.parse::<u64>() {
                Ok(seconds) => config.controller.retry_reload_delay_seconds = seconds,
                Err(e) => debug!("Ignoring {}={}: {}", RETRY_DELAY_ENV, delay, e),
            }
        }

        config
    }
}
