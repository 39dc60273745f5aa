//! Pod state machine and the pod-based fallback used by controllers

use crate::models::{ContainerState, ContainerStatus, Pod, ResourceKind, State, Status};
use k8s_openapi::api::core::v1 as corev1;

/// Derive the state of a single pod
///
/// A deletion timestamp overrides the phase. `Pending` pods report why
/// they are not scheduled or initialized (or the first waiting container),
/// `Running` pods become `Ready` once the Ready condition holds and
/// `Failed` pods report the first container that exited non-zero.
pub fn pod_state(pod: &corev1::Pod) -> State {
    if pod.metadata.deletion_timestamp.is_some() {
        return State::terminating();
    }

    let status = pod.status.as_ref();
    let phase = Status::from_pod_phase(status.and_then(|s| s.phase.as_deref()));

    match phase {
        Status::Pending => {
            let (reason, message) = pending_reason(pod);
            State::new(Status::Pending, reason, message)
        }
        Status::Running => match ready_condition(pod) {
            Some(condition) if condition.status == "True" => State::ready(),
            Some(condition) => State::new(
                Status::Running,
                condition.reason.clone().unwrap_or_default(),
                condition.message.clone().unwrap_or_default(),
            ),
            None => State::new(Status::Running, "", ""),
        },
        Status::Failed => {
            let (reason, message) = failed_reason(pod);
            State::new(Status::Failed, reason, message)
        }
        other => State::new(other, "", ""),
    }
}

fn conditions(pod: &corev1::Pod) -> &[corev1::PodCondition] {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default()
}

fn container_states(pod: &corev1::Pod) -> impl Iterator<Item = &corev1::ContainerState> {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default()
        .iter()
        .filter_map(|status| status.state.as_ref())
}

fn ready_condition(pod: &corev1::Pod) -> Option<&corev1::PodCondition> {
    conditions(pod).iter().find(|c| c.type_ == "Ready")
}

fn pending_reason(pod: &corev1::Pod) -> (String, String) {
    if let Some(condition) = conditions(pod).iter().find(|c| {
        (c.type_ == "PodScheduled" || c.type_ == "Initialized") && c.status != "True"
    }) {
        return (
            condition.reason.clone().unwrap_or_default(),
            condition.message.clone().unwrap_or_default(),
        );
    }

    container_states(pod)
        .find_map(|state| state.waiting.as_ref())
        .map(|waiting| {
            (
                waiting.reason.clone().unwrap_or_default(),
                waiting.message.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

fn failed_reason(pod: &corev1::Pod) -> (String, String) {
    container_states(pod)
        .filter_map(|state| state.terminated.as_ref())
        .find(|terminated| terminated.exit_code != 0)
        .map(|terminated| {
            (
                terminated.reason.clone().unwrap_or_default(),
                terminated.message.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

/// Summarize one container's lifecycle state
pub fn container_state(state: Option<&corev1::ContainerState>) -> ContainerState {
    let Some(state) = state else {
        return ContainerState::default();
    };

    if let Some(terminated) = &state.terminated {
        ContainerState {
            status: ContainerStatus::Terminated,
            reason: terminated.reason.clone().unwrap_or_default(),
            message: terminated.message.clone().unwrap_or_default(),
        }
    } else if let Some(waiting) = &state.waiting {
        ContainerState {
            status: ContainerStatus::Waiting,
            reason: waiting.reason.clone().unwrap_or_default(),
            message: waiting.message.clone().unwrap_or_default(),
        }
    } else if state.running.is_some() {
        ContainerState {
            status: ContainerStatus::Running,
            ..Default::default()
        }
    } else {
        ContainerState::default()
    }
}

/// Whether a controller is being torn down: it has pods and all of them
/// are terminating
pub fn all_pods_terminating(pods: &[Pod]) -> bool {
    !pods.is_empty()
        && pods
            .iter()
            .all(|p| p.meta.state.status == Status::Terminating)
}

/// Explain a not-ready controller from the states of its pods
///
/// With no pods the controller is `PodNotCreated`. Otherwise the first
/// `Unknown` pod wins, then the first `Pending` pod, then the first
/// `Running` one, independent of where each class sits in the slice.
/// Only when every pod is terminating is the controller `Terminating`;
/// anything else means a rollout in progress.
pub fn state_by_pods(pods: &[Pod], controller_kind: ResourceKind) -> State {
    if pods.is_empty() {
        return State::pending("PodNotCreated", "There is no pod created");
    }

    for (status, reason) in [
        (Status::Unknown, "PodUnknown"),
        (Status::Pending, "PodPending"),
        (Status::Running, "PodRunning"),
    ] {
        if let Some(pod) = pods.iter().find(|p| p.meta.state.status == status) {
            return State::pending(
                reason,
                format!(
                    "Pod {}/{} is in state {}",
                    pod.meta.namespace, pod.meta.name, status
                ),
            );
        }
    }

    if all_pods_terminating(pods) {
        return State::terminating();
    }

    State::pending(
        format!("{}Updating", controller_kind),
        format!("{} is updating", controller_kind),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Meta;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn raw_pod(value: serde_json::Value) -> corev1::Pod {
        serde_json::from_value(value).unwrap()
    }

    fn model_pod(name: &str, status: Status) -> Pod {
        Pod {
            meta: Meta::new(ResourceKind::Pod, "ns", name, State::new(status, "", "")),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            host_ip: String::new(),
            pod_ip: String::new(),
            containers: Vec::new(),
            age: String::new(),
        }
    }

    #[test]
    fn test_deletion_timestamp_overrides_phase() {
        let pod = raw_pod(json!({
            "metadata": {"name": "p", "deletionTimestamp": "2024-01-01T00:00:00Z"},
            "status": {"phase": "Running", "conditions": [{"type": "Ready", "status": "True"}]}
        }));
        assert_eq!(pod_state(&pod), State::terminating());
    }

    #[test]
    fn test_running_pod_with_ready_condition_is_ready() {
        let pod = raw_pod(json!({
            "metadata": {"name": "p"},
            "status": {"phase": "Running", "conditions": [{"type": "Ready", "status": "True"}]}
        }));
        assert_eq!(pod_state(&pod), State::ready());
    }

    #[test]
    fn test_running_pod_not_ready_keeps_condition_reason() {
        let pod = raw_pod(json!({
            "metadata": {"name": "p"},
            "status": {"phase": "Running", "conditions": [{
                "type": "Ready", "status": "False",
                "reason": "ContainersNotReady", "message": "containers with unready status: [app]"
            }]}
        }));
        let state = pod_state(&pod);
        assert_eq!(state.status, Status::Running);
        assert_eq!(state.reason, "ContainersNotReady");
    }

    #[test]
    fn test_pending_pod_prefers_failing_scheduling_condition() {
        let pod = raw_pod(json!({
            "metadata": {"name": "p"},
            "status": {
                "phase": "Pending",
                "conditions": [{
                    "type": "PodScheduled", "status": "False",
                    "reason": "Unschedulable", "message": "0/3 nodes are available"
                }],
                "containerStatuses": [{
                    "name": "app", "image": "app:1", "imageID": "", "ready": false, "restartCount": 0,
                    "state": {"waiting": {"reason": "ContainerCreating"}}
                }]
            }
        }));
        let state = pod_state(&pod);
        assert_eq!(state.status, Status::Pending);
        assert_eq!(state.reason, "Unschedulable");
        assert_eq!(state.message, "0/3 nodes are available");
    }

    #[test]
    fn test_pending_pod_falls_back_to_waiting_container() {
        let pod = raw_pod(json!({
            "metadata": {"name": "p"},
            "status": {
                "phase": "Pending",
                "containerStatuses": [{
                    "name": "app", "image": "app:1", "imageID": "", "ready": false, "restartCount": 0,
                    "state": {"waiting": {"reason": "ImagePullBackOff", "message": "back-off"}}
                }]
            }
        }));
        let state = pod_state(&pod);
        assert_eq!(state.reason, "ImagePullBackOff");
        assert_eq!(state.message, "back-off");
    }

    #[test]
    fn test_failed_pod_reports_first_non_zero_exit() {
        let pod = raw_pod(json!({
            "metadata": {"name": "p"},
            "status": {
                "phase": "Failed",
                "containerStatuses": [
                    {"name": "ok", "image": "i", "imageID": "", "ready": false, "restartCount": 0,
                     "state": {"terminated": {"exitCode": 0, "reason": "Completed"}}},
                    {"name": "bad", "image": "i", "imageID": "", "ready": false, "restartCount": 3,
                     "state": {"terminated": {"exitCode": 137, "reason": "OOMKilled", "message": "killed"}}}
                ]
            }
        }));
        let state = pod_state(&pod);
        assert_eq!(state.status, Status::Failed);
        assert_eq!(state.reason, "OOMKilled");
        assert_eq!(state.message, "killed");
    }

    #[test]
    fn test_missing_phase_is_unknown() {
        let pod = raw_pod(json!({"metadata": {"name": "p"}}));
        assert_eq!(pod_state(&pod).status, Status::Unknown);
    }

    #[test]
    fn test_container_state_keeps_reason_and_message_apart() {
        let state: corev1::ContainerState = serde_json::from_value(json!({
            "terminated": {"exitCode": 1, "reason": "Error", "message": "boom"}
        }))
        .unwrap();
        let summary = container_state(Some(&state));
        assert_eq!(summary.status, ContainerStatus::Terminated);
        assert_eq!(summary.reason, "Error");
        assert_eq!(summary.message, "boom");
        assert_eq!(container_state(None).status, ContainerStatus::Unknown);
    }

    #[test]
    fn test_no_pods_is_pod_not_created() {
        let state = state_by_pods(&[], ResourceKind::Deployment);
        assert_eq!(state, State::pending("PodNotCreated", "There is no pod created"));
    }

    #[test]
    fn test_pending_beats_running_in_any_order() {
        let forward = [
            model_pod("a", Status::Running),
            model_pod("b", Status::Pending),
        ];
        let backward = [
            model_pod("b", Status::Pending),
            model_pod("a", Status::Running),
        ];
        for pods in [&forward[..], &backward[..]] {
            let state = state_by_pods(pods, ResourceKind::Deployment);
            assert_eq!(state.reason, "PodPending");
            assert_eq!(state.message, "Pod ns/b is in state Pending");
        }
    }

    #[test]
    fn test_first_unknown_pod_is_reported() {
        let pods = [
            model_pod("running", Status::Running),
            model_pod("first", Status::Unknown),
            model_pod("pending", Status::Pending),
            model_pod("second", Status::Unknown),
        ];
        let state = state_by_pods(&pods, ResourceKind::StatefulSet);
        assert_eq!(state.reason, "PodUnknown");
        assert_eq!(state.message, "Pod ns/first is in state Unknown");
    }

    #[test]
    fn test_all_terminating() {
        let pods = [
            model_pod("a", Status::Terminating),
            model_pod("b", Status::Terminating),
        ];
        assert_eq!(
            state_by_pods(&pods, ResourceKind::DaemonSet),
            State::terminating()
        );
    }

    #[test]
    fn test_ready_pods_mean_updating() {
        let pods = [
            model_pod("a", Status::Ready),
            model_pod("b", Status::Terminating),
        ];
        let state = state_by_pods(&pods, ResourceKind::Deployment);
        assert_eq!(
            state,
            State::pending("DeploymentUpdating", "Deployment is updating")
        );
    }

    #[test]
    fn test_state_by_pods_is_deterministic() {
        let pods = [
            model_pod("a", Status::Ready),
            model_pod("b", Status::Running),
        ];
        let first = state_by_pods(&pods, ResourceKind::Deployment);
        for _ in 0..10 {
            assert_eq!(state_by_pods(&pods, ResourceKind::Deployment), first);
        }
    }
}
