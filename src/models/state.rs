//! Normalized resource state
//!
//! Every resource carries a [`State`] derived from its last observed
//! spec and status. States are recomputed on every read, never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind-independent readiness vocabulary
///
/// Workload-level derivation produces only `Ready`, `Pending`,
/// `Terminating`, `Unknown` and `NotFound`. Pods additionally surface
/// their raw phase (`Running`, `Succeeded`, `Failed`) and nodes report
/// `NotReady`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    Ready,
    Pending,
    Running,
    Succeeded,
    Failed,
    Terminating,
    NotReady,
    #[default]
    Unknown,
    NotFound,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ready => "Ready",
            Status::Pending => "Pending",
            Status::Running => "Running",
            Status::Succeeded => "Succeeded",
            Status::Failed => "Failed",
            Status::Terminating => "Terminating",
            Status::NotReady => "NotReady",
            Status::Unknown => "Unknown",
            Status::NotFound => "NotFound",
        }
    }

    /// Map a Kubernetes pod phase onto the vocabulary
    ///
    /// Unrecognized or missing phases become `Unknown`.
    pub fn from_pod_phase(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => Status::Pending,
            Some("Running") => Status::Running,
            Some("Succeeded") => Status::Succeeded,
            Some("Failed") => Status::Failed,
            _ => Status::Unknown,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived state: status plus free-form diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct State {
    pub status: Status,
    pub reason: String,
    pub message: String,
}

impl State {
    pub fn new(status: Status, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn ready() -> Self {
        Self::new(Status::Ready, "", "")
    }

    pub fn pending(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Status::Pending, reason, message)
    }

    pub fn terminating() -> Self {
        Self::new(Status::Terminating, "", "")
    }

    pub fn not_found() -> Self {
        Self::new(Status::NotFound, "", "")
    }

    pub fn is_ready(&self) -> bool {
        self.status == Status::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_phase_mapping() {
        assert_eq!(Status::from_pod_phase(Some("Running")), Status::Running);
        assert_eq!(Status::from_pod_phase(Some("Evicted")), Status::Unknown);
        assert_eq!(Status::from_pod_phase(None), Status::Unknown);
    }

    #[test]
    fn test_state_serializes_status_as_string() {
        let json = serde_json::to_value(State::pending("PodPending", "waiting")).unwrap();
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["reason"], "PodPending");
    }
}
