//! Configuration for release-sync
//!
//! Built-in defaults, overlaid by one YAML file, overlaid by environment
//! variables.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, ControllerConfig, LoggerConfig, NodesConfig};
