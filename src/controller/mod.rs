//! Release dependency reconciliation
//!
//! Structure:
//! - `queue.rs` - Deduplicating, delaying work queue
//! - `dependency.rs` - Dependency reference parsing and output config diffing
//! - `installer.rs` - The installer the controller asks to reload releases
//! - `publisher.rs` - Config delta events for downstream consumers
//! - `release_config.rs` - The controller wiring queues, workers and informer events

pub mod dependency;
pub mod installer;
pub mod publisher;
pub mod queue;
pub mod release_config;

pub use dependency::{InvalidDependency, find_dependents, output_config_changed, parse_dependency};
pub use installer::ReleaseInstaller;
pub use publisher::{DeltaEventType, ReleaseConfigDeltaEvent, ReleaseConfigPublisher};
pub use queue::WorkQueue;
pub use release_config::ReleaseConfigController;
