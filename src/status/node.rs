//! States of cluster-scoped and storage objects

use crate::models::{State, Status};
use k8s_openapi::api::core::v1 as corev1;

/// `Ready` when the Ready condition is true, otherwise `NotReady`
/// carrying that condition's diagnostics. A node without a Ready
/// condition is `NotReady/Unknown`.
pub fn node_state(node: &corev1::Node) -> State {
    let ready = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default()
        .iter()
        .find(|c| c.type_ == "Ready");

    match ready {
        Some(condition) if condition.status == "True" => State::ready(),
        Some(condition) => State::new(
            Status::NotReady,
            condition.reason.clone().unwrap_or_default(),
            condition.message.clone().unwrap_or_default(),
        ),
        None => State::new(Status::NotReady, "Unknown", ""),
    }
}

pub fn namespace_state(namespace: &corev1::Namespace) -> State {
    match namespace.status.as_ref().and_then(|s| s.phase.as_deref()) {
        Some("Active") => State::ready(),
        Some("Terminating") => State::terminating(),
        _ => State::new(Status::Unknown, "", ""),
    }
}

/// Claims map onto the vocabulary by phase; a lost claim keeps the
/// phase name as its reason.
pub fn pvc_state(pvc: &corev1::PersistentVolumeClaim) -> State {
    match pvc.status.as_ref().and_then(|s| s.phase.as_deref()) {
        Some("Bound") => State::ready(),
        Some("Pending") => State::pending("", ""),
        Some("Lost") => State::new(Status::Unknown, "Lost", "the bound volume is lost"),
        _ => State::new(Status::Unknown, "", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_states() {
        let ready: corev1::Node = serde_json::from_value(json!({
            "metadata": {"name": "n1"},
            "status": {"conditions": [{"type": "Ready", "status": "True"}]}
        }))
        .unwrap();
        assert_eq!(node_state(&ready), State::ready());

        let pressured: corev1::Node = serde_json::from_value(json!({
            "metadata": {"name": "n2"},
            "status": {"conditions": [
                {"type": "MemoryPressure", "status": "True"},
                {"type": "Ready", "status": "False", "reason": "KubeletNotReady", "message": "PLEG is not healthy"}
            ]}
        }))
        .unwrap();
        assert_eq!(
            node_state(&pressured),
            State::new(Status::NotReady, "KubeletNotReady", "PLEG is not healthy")
        );

        let bare: corev1::Node = serde_json::from_value(json!({"metadata": {"name": "n3"}})).unwrap();
        assert_eq!(node_state(&bare), State::new(Status::NotReady, "Unknown", ""));
    }

    #[test]
    fn test_namespace_and_pvc_states() {
        let ns: corev1::Namespace = serde_json::from_value(json!({
            "metadata": {"name": "tenant"}, "status": {"phase": "Terminating"}
        }))
        .unwrap();
        assert_eq!(namespace_state(&ns), State::terminating());

        let pvc: corev1::PersistentVolumeClaim = serde_json::from_value(json!({
            "metadata": {"name": "data"}, "status": {"phase": "Bound"}
        }))
        .unwrap();
        assert!(pvc_state(&pvc).is_ready());
    }
}
