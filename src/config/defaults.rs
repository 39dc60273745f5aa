//! Default configuration values
//!
//! Zero worker counts, a zero retry delay and a zero sync timeout in a
//! loaded file mean "use the default" rather than "disable".

use super::schema::{
    Config, default_cache_sync_timeout_seconds, default_node_concurrency,
    default_publish_workers, default_reload_workers, default_retry_reload_delay_seconds,
    default_workers,
};

/// Get the default configuration
pub fn default_config() -> Config {
    Config::default()
}

/// Replace zero values that cannot be meant literally
pub fn fill_zero_values(mut config: Config) -> Config {
    if config.cache_sync_timeout_seconds == 0 {
        config.cache_sync_timeout_seconds = default_cache_sync_timeout_seconds();
    }
    let controller = &mut config.controller;
    if controller.workers == 0 {
        controller.workers = default_workers();
    }
    if controller.reload_workers == 0 {
        controller.reload_workers = default_reload_workers();
    }
    if controller.retry_reload_delay_seconds == 0 {
        controller.retry_reload_delay_seconds = default_retry_reload_delay_seconds();
    }
    if controller.publish_workers == 0 {
        controller.publish_workers = default_publish_workers();
    }
    if config.nodes.concurrency == 0 {
        config.nodes.concurrency = default_node_concurrency();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_fall_back() {
        let mut config = default_config();
        config.controller.workers = 0;
        config.controller.retry_reload_delay_seconds = 0;
        config.nodes.concurrency = 0;
        config.cache_sync_timeout_seconds = 0;

        let config = fill_zero_values(config);
        assert_eq!(config.cache_sync_timeout_seconds, 60);
        assert_eq!(config.controller.workers, 1);
        assert_eq!(config.controller.retry_reload_delay_seconds, 5);
        assert_eq!(config.nodes.concurrency, 8);
    }
}
