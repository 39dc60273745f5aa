use super::{annotations_of, labels_of, parse_time, short_age};
use crate::models::{Container, Meta, Pod, ResourceKind};
use crate::status;
use k8s_openapi::api::core::v1 as corev1;
use kube::ResourceExt;

pub fn pod(pod: &corev1::Pod) -> Pod {
    let status = pod.status.as_ref();
    let containers = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default()
        .iter()
        .map(|c| Container {
            name: c.name.clone(),
            image: c.image.clone(),
            ready: c.ready,
            restart_count: c.restart_count,
            state: status::container_state(c.state.as_ref()),
        })
        .collect();

    Pod {
        meta: Meta::new(
            ResourceKind::Pod,
            &pod.namespace().unwrap_or_default(),
            &pod.name_any(),
            status::pod_state(pod),
        ),
        labels: labels_of(pod),
        annotations: annotations_of(pod),
        host_ip: status.and_then(|s| s.host_ip.clone()).unwrap_or_default(),
        pod_ip: status.and_then(|s| s.pod_ip.clone()).unwrap_or_default(),
        containers,
        age: short_age(
            parse_time(pod.metadata.creation_timestamp.as_ref()),
            chrono::Utc::now(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerStatus, Status};

    #[test]
    fn test_pod_conversion() {
        let raw: corev1::Pod = serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": "web-0", "namespace": "apps",
                "labels": {"app": "web"},
                "creationTimestamp": "2020-01-01T00:00:00Z"
            },
            "status": {
                "phase": "Running",
                "hostIP": "10.0.0.5",
                "podIP": "172.16.0.9",
                "conditions": [{"type": "Ready", "status": "True"}],
                "containerStatuses": [{
                    "name": "app", "image": "web:2", "imageID": "", "ready": true,
                    "restartCount": 1, "state": {"running": {}}
                }]
            }
        }))
        .unwrap();

        let pod = pod(&raw);
        assert_eq!(pod.meta.namespace, "apps");
        assert_eq!(pod.meta.state.status, Status::Ready);
        assert_eq!(pod.host_ip, "10.0.0.5");
        assert_eq!(pod.pod_ip, "172.16.0.9");
        assert_eq!(pod.labels["app"], "web");
        assert_eq!(pod.containers.len(), 1);
        assert_eq!(pod.containers[0].restart_count, 1);
        assert_eq!(pod.containers[0].state.status, ContainerStatus::Running);
        assert!(pod.age.ends_with('y'));
    }
}
