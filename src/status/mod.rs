//! State derivation engine
//!
//! Pure functions turning raw Kubernetes status fields (and, for
//! controllers, the states of owned pods) into a [`State`](crate::models::State).
//! Nothing here performs I/O, so every result is reproducible from the
//! same snapshot.

mod node;
mod pod;
mod workload;

pub use node::{namespace_state, node_state, pvc_state};
pub use pod::{all_pods_terminating, container_state, pod_state, state_by_pods};
pub use workload::{
    application_instance_state, daemon_set_state, deployment_state, is_daemon_set_ready,
    is_deployment_ready, is_stateful_set_ready, job_state, stateful_set_state,
};
