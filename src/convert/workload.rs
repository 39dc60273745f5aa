use super::{annotations_of, labels_of};
use crate::models::{DaemonSet, Deployment, Job, Meta, Pod, ResourceKind, State, StatefulSet};
use crate::selector::{Selector, SelectorError};
use crate::status;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::batch::v1 as batchv1;
use kube::ResourceExt;

fn meta_of<K: ResourceExt>(kind: ResourceKind, obj: &K) -> Meta {
    Meta::new(
        kind,
        &obj.namespace().unwrap_or_default(),
        &obj.name_any(),
        State::default(),
    )
}

pub fn deployment(deployment: &appsv1::Deployment, pods: Vec<Pod>) -> Deployment {
    let status = deployment.status.as_ref();
    let mut model = Deployment {
        meta: meta_of(ResourceKind::Deployment, deployment),
        labels: labels_of(deployment),
        annotations: annotations_of(deployment),
        expected_replicas: deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1),
        updated_replicas: status.and_then(|s| s.updated_replicas).unwrap_or(0),
        current_replicas: status.and_then(|s| s.replicas).unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
        pods,
    };
    model.meta.state = status::deployment_state(&model);
    model
}

pub fn stateful_set(
    stateful_set: &appsv1::StatefulSet,
    pods: Vec<Pod>,
) -> Result<StatefulSet, SelectorError> {
    let spec = stateful_set.spec.as_ref();
    let status = stateful_set.status.as_ref();

    // A missing strategy type defaults to RollingUpdate on the API server
    let partition = spec
        .and_then(|s| s.update_strategy.as_ref())
        .filter(|u| u.type_.as_deref().is_none_or(|t| t == "RollingUpdate"))
        .and_then(|u| u.rolling_update.as_ref())
        .and_then(|r| r.partition);

    let selector = match spec.map(|s| &s.selector) {
        Some(selector) => Selector::from_label_selector(selector)?.to_string(),
        None => String::new(),
    };

    let mut model = StatefulSet {
        meta: meta_of(ResourceKind::StatefulSet, stateful_set),
        labels: labels_of(stateful_set),
        annotations: annotations_of(stateful_set),
        expected_replicas: spec.and_then(|s| s.replicas).unwrap_or(1),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        updated_replicas: status.and_then(|s| s.updated_replicas).unwrap_or(0),
        partition,
        current_version: status
            .and_then(|s| s.current_revision.clone())
            .unwrap_or_default(),
        update_version: status
            .and_then(|s| s.update_revision.clone())
            .unwrap_or_default(),
        selector,
        pods,
    };
    model.meta.state = status::stateful_set_state(&model);
    Ok(model)
}

pub fn daemon_set(daemon_set: &appsv1::DaemonSet, pods: Vec<Pod>) -> DaemonSet {
    let status = daemon_set.status.as_ref();
    let mut model = DaemonSet {
        meta: meta_of(ResourceKind::DaemonSet, daemon_set),
        labels: labels_of(daemon_set),
        annotations: annotations_of(daemon_set),
        desired_number_scheduled: status.map(|s| s.desired_number_scheduled).unwrap_or(0),
        updated_number_scheduled: status
            .and_then(|s| s.updated_number_scheduled)
            .unwrap_or(0),
        number_available: status.and_then(|s| s.number_available).unwrap_or(0),
        pods,
    };
    model.meta.state = status::daemon_set_state(&model);
    model
}

pub fn job(job: &batchv1::Job, pods: Vec<Pod>) -> Job {
    let status = job.status.as_ref();
    let mut model = Job {
        meta: meta_of(ResourceKind::Job, job),
        labels: labels_of(job),
        annotations: annotations_of(job),
        expected_completion: job
            .spec
            .as_ref()
            .and_then(|s| s.completions)
            .unwrap_or(1),
        succeeded: status.and_then(|s| s.succeeded).unwrap_or(0),
        failed: status.and_then(|s| s.failed).unwrap_or(0),
        active: status.and_then(|s| s.active).unwrap_or(0),
        pods,
    };
    model.meta.state = status::job_state(job);
    model
}
