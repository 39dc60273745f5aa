//! release-sync library
//!
//! A watch-fed cache over Kubernetes workloads and the two custom kinds
//! ReleaseConfig and ApplicationInstance, a readiness engine that turns raw
//! objects into a normalized [`State`](models::State), and a controller
//! that reloads releases when a release they depend on publishes new
//! output configuration.

pub mod cache;
pub mod cli;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod kube;
pub mod logging;
pub mod models;
pub mod ops;
pub mod selector;
pub mod status;

// Re-export commonly used types for convenience
pub use cache::{Lookup, ResourceCache};
pub use controller::{ReleaseConfigController, ReleaseInstaller};
pub use error::{CacheError, InstallerError};
pub use models::{Resource, ResourceKind, ResourceRef, ResourceSet, State, Status};
