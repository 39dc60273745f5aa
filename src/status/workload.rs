//! Readiness predicates for controllers and custom resources

use super::pod::{all_pods_terminating, state_by_pods};
use crate::models::crd::ApplicationInstance as ApplicationInstanceCrd;
use crate::models::{DaemonSet, Deployment, ResourceKind, ResourceSet, State, StatefulSet};
use k8s_openapi::api::batch::v1 as batchv1;

/// A deployment is ready once every expected replica has been updated,
/// no stale replicas remain and every updated replica is available.
pub fn is_deployment_ready(deployment: &Deployment) -> bool {
    deployment.updated_replicas >= deployment.expected_replicas
        && deployment.current_replicas <= deployment.updated_replicas
        && deployment.available_replicas >= deployment.updated_replicas
}

/// Pods that are all terminating outrank the replica counters, which lag
/// behind a deletion.
pub fn deployment_state(deployment: &Deployment) -> State {
    if all_pods_terminating(&deployment.pods) {
        State::terminating()
    } else if is_deployment_ready(deployment) {
        State::ready()
    } else {
        state_by_pods(&deployment.pods, ResourceKind::Deployment)
    }
}

/// Three independent sufficient conditions, checked in order: enough
/// ready replicas, a partitioned rolling update that reached its
/// partition, or no pending revision change.
pub fn is_stateful_set_ready(stateful_set: &StatefulSet) -> bool {
    if stateful_set.ready_replicas >= stateful_set.expected_replicas {
        return true;
    }
    if let Some(partition) = stateful_set.partition
        && stateful_set.updated_replicas >= stateful_set.expected_replicas - partition
    {
        return true;
    }
    stateful_set.update_version == stateful_set.current_version
}

pub fn stateful_set_state(stateful_set: &StatefulSet) -> State {
    if all_pods_terminating(&stateful_set.pods) {
        State::terminating()
    } else if is_stateful_set_ready(stateful_set) {
        State::ready()
    } else {
        state_by_pods(&stateful_set.pods, ResourceKind::StatefulSet)
    }
}

pub fn is_daemon_set_ready(daemon_set: &DaemonSet) -> bool {
    daemon_set.updated_number_scheduled >= daemon_set.desired_number_scheduled
        && daemon_set.number_available >= daemon_set.desired_number_scheduled
}

pub fn daemon_set_state(daemon_set: &DaemonSet) -> State {
    if all_pods_terminating(&daemon_set.pods) {
        State::terminating()
    } else if is_daemon_set_ready(daemon_set) {
        State::ready()
    } else {
        state_by_pods(&daemon_set.pods, ResourceKind::DaemonSet)
    }
}

/// Job state from its conditions and active count
///
/// `Complete=True` wins, `Failed=True` is pending with the condition's
/// diagnostics. Conditions that settle neither fall through to the
/// active pod count.
pub fn job_state(job: &batchv1::Job) -> State {
    let status = job.status.as_ref();
    let conditions = status
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    for condition in conditions {
        if condition.status != "True" {
            continue;
        }
        match condition.type_.as_str() {
            "Complete" => return State::ready(),
            "Failed" => {
                return State::pending(
                    condition.reason.clone().unwrap_or_default(),
                    condition.message.clone().unwrap_or_default(),
                );
            }
            _ => {}
        }
    }

    let active = status.and_then(|s| s.active).unwrap_or(0);
    if active > 0 {
        State::pending("JobActive", format!("There are {} active pod", active))
    } else {
        State::terminating()
    }
}

/// Instance state from its own status and the state of its modules
pub fn application_instance_state(
    instance: &ApplicationInstanceCrd,
    modules: &ResourceSet,
) -> State {
    let ready = instance.status.as_ref().is_some_and(|s| s.ready);
    let mut state = if ready {
        State::ready()
    } else {
        State::pending("ModuleNotEnough", "there is module still not created")
    };

    if let (false, Some(blocking)) = modules.is_ready() {
        state = State::pending(
            "ModulePending",
            format!(
                "{} {}/{} is in state {}",
                blocking.kind_name(),
                blocking.namespace(),
                blocking.name(),
                blocking.state().status
            ),
        );
    }
    state
}
