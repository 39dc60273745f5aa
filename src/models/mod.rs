//! Model layer
//!
//! Structure:
//! - `kind.rs` - Closed enumeration of supported resource kinds
//! - `state.rs` - Normalized readiness state
//! - `resources.rs` - Per-kind resource models and the `Resource` union
//! - `resource_set.rs` - Aggregation of an application's resources
//! - `crd.rs` - ReleaseConfig and ApplicationInstance custom resources
//! - `tenant.rs`, `event.rs` - Summaries for auxiliary queries

pub mod crd;
pub mod event;
pub mod kind;
pub mod resource_set;
pub mod resources;
pub mod state;
pub mod tenant;

pub use event::{Event, EventList};
pub use kind::ResourceKind;
pub use resource_set::ResourceSet;
pub use resources::*;
pub use state::{State, Status};
pub use tenant::{TenantInfo, TenantInfoList};
