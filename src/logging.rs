//! Logging initialization

use crate::config::LoggerConfig;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(config: &LoggerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|e| {
            eprintln!("Invalid log level '{}': {}, using info", config.level, e);
            EnvFilter::new("info")
        })
    });

    // stdout is reserved for command output
    let installed = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
