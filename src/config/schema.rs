//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Namespace watched by the informers; empty watches all namespaces
    #[serde(default)]
    pub namespace: String,

    /// Re-deliver known ReleaseConfigs at this interval; 0 disables resync
    #[serde(default)]
    pub resync_seconds: u64,

    /// How long to wait for the initial list of every kind
    #[serde(default = "default_cache_sync_timeout_seconds")]
    pub cache_sync_timeout_seconds: u64,

    /// Dependency controller settings
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Node summary settings
    #[serde(default)]
    pub nodes: NodesConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Worker pool sizes and retry timing of the dependency controller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Workers resolving dependents of a changed release
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Workers reloading dependent releases
    #[serde(default = "default_reload_workers")]
    pub reload_workers: usize,

    /// Delay before retrying a reload that found the release busy
    #[serde(default = "default_retry_reload_delay_seconds")]
    pub retry_reload_delay_seconds: u64,

    /// Workers publishing config deltas
    #[serde(default = "default_publish_workers")]
    pub publish_workers: usize,
}

/// Node summary configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodesConfig {
    /// Nodes summarised concurrently
    #[serde(default = "default_node_concurrency")]
    pub concurrency: usize,
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
pub(crate) fn default_cache_sync_timeout_seconds() -> u64 {
    60
}

pub(crate) fn default_workers() -> usize {
    1
}

pub(crate) fn default_reload_workers() -> usize {
    10
}

pub(crate) fn default_retry_reload_delay_seconds() -> u64 {
    5
}

pub(crate) fn default_publish_workers() -> usize {
    2
}

pub(crate) fn default_node_concurrency() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Namespace restriction for the informers
    pub fn informer_namespace(&self) -> Option<String> {
        (!self.namespace.is_empty()).then(|| self.namespace.clone())
    }

    pub fn resync_period(&self) -> Option<Duration> {
        (self.resync_seconds > 0).then(|| Duration::from_secs(self.resync_seconds))
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_sync_timeout_seconds)
    }
}

impl ControllerConfig {
    pub fn retry_reload_delay(&self) -> Duration {
        Duration::from_secs(self.retry_reload_delay_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            resync_seconds: 0,
            cache_sync_timeout_seconds: default_cache_sync_timeout_seconds(),
            controller: ControllerConfig::default(),
            nodes: NodesConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            reload_workers: default_reload_workers(),
            retry_reload_delay_seconds: default_retry_reload_delay_seconds(),
            publish_workers: default_publish_workers(),
        }
    }
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            concurrency: default_node_concurrency(),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
