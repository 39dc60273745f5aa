use super::{annotations_of, labels_of};
use crate::models::{
    ConfigMap, Ingress, Meta, Namespace, PersistentVolumeClaim, ResourceKind, ResourceQuota,
    Secret, State, StorageClass,
};
use crate::status;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::networking::v1 as networkingv1;
use k8s_openapi::api::storage::v1 as storagev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;
use std::collections::BTreeMap;

fn meta_of<K: ResourceExt>(kind: ResourceKind, obj: &K, state: State) -> Meta {
    Meta::new(
        kind,
        &obj.namespace().unwrap_or_default(),
        &obj.name_any(),
        state,
    )
}

fn quantity_map(list: Option<&BTreeMap<String, Quantity>>) -> BTreeMap<String, String> {
    list.into_iter()
        .flatten()
        .map(|(name, quantity)| (name.clone(), quantity.0.clone()))
        .collect()
}

/// Host and backend of the first path of the first rule
pub fn ingress(ingress: &networkingv1::Ingress) -> Ingress {
    let mut model = Ingress {
        meta: meta_of(ResourceKind::Ingress, ingress, State::ready()),
        host: String::new(),
        path: String::new(),
        service_name: String::new(),
        service_port: String::new(),
    };

    let rule = ingress
        .spec
        .as_ref()
        .and_then(|s| s.rules.as_ref())
        .and_then(|rules| rules.first());
    if let Some(rule) = rule {
        model.host = rule.host.clone().unwrap_or_default();
        if let Some(path) = rule.http.as_ref().and_then(|h| h.paths.first()) {
            model.path = path.path.clone().unwrap_or_default();
            if let Some(backend) = path.backend.service.as_ref() {
                model.service_name = backend.name.clone();
                model.service_port = match backend.port.as_ref() {
                    Some(port) => match (port.number, port.name.as_ref()) {
                        (Some(number), _) => number.to_string(),
                        (None, Some(name)) => name.clone(),
                        (None, None) => String::new(),
                    },
                    None => String::new(),
                };
            }
        }
    }
    model
}

pub fn config_map(config_map: &corev1::ConfigMap) -> ConfigMap {
    ConfigMap {
        meta: meta_of(ResourceKind::ConfigMap, config_map, State::ready()),
        data: config_map.data.clone().unwrap_or_default(),
    }
}

pub fn secret(secret: &corev1::Secret) -> Secret {
    Secret {
        meta: meta_of(ResourceKind::Secret, secret, State::ready()),
        data: secret
            .data
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), String::from_utf8_lossy(&value.0).into_owned()))
            .collect(),
        secret_type: secret.type_.clone().unwrap_or_default(),
    }
}

pub fn persistent_volume_claim(pvc: &corev1::PersistentVolumeClaim) -> PersistentVolumeClaim {
    let spec = pvc.spec.as_ref();
    PersistentVolumeClaim {
        meta: meta_of(
            ResourceKind::PersistentVolumeClaim,
            pvc,
            status::pvc_state(pvc),
        ),
        storage_class: spec
            .and_then(|s| s.storage_class_name.clone())
            .unwrap_or_default(),
        volume_name: spec.and_then(|s| s.volume_name.clone()).unwrap_or_default(),
        capacity: pvc
            .status
            .as_ref()
            .and_then(|s| s.capacity.as_ref())
            .and_then(|c| c.get("storage"))
            .map(|q| q.0.clone())
            .unwrap_or_default(),
        access_modes: spec
            .and_then(|s| s.access_modes.clone())
            .unwrap_or_default(),
        volume_mode: spec.and_then(|s| s.volume_mode.clone()).unwrap_or_default(),
    }
}

pub fn storage_class(storage_class: &storagev1::StorageClass) -> StorageClass {
    StorageClass {
        meta: meta_of(ResourceKind::StorageClass, storage_class, State::ready()),
        provisioner: storage_class.provisioner.clone(),
        reclaim_policy: storage_class.reclaim_policy.clone().unwrap_or_default(),
        allow_volume_expansion: storage_class.allow_volume_expansion.unwrap_or(false),
        volume_binding_mode: storage_class
            .volume_binding_mode
            .clone()
            .unwrap_or_default(),
    }
}

pub fn namespace(namespace: &corev1::Namespace) -> Namespace {
    Namespace {
        meta: meta_of(
            ResourceKind::Namespace,
            namespace,
            status::namespace_state(namespace),
        ),
        labels: labels_of(namespace),
        annotations: annotations_of(namespace),
    }
}

pub fn resource_quota(quota: &corev1::ResourceQuota) -> ResourceQuota {
    ResourceQuota {
        meta: meta_of(ResourceKind::ResourceQuota, quota, State::ready()),
        resource_limits: quantity_map(quota.spec.as_ref().and_then(|s| s.hard.as_ref())),
        resource_used: quantity_map(quota.status.as_ref().and_then(|s| s.used.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use serde_json::json;

    #[test]
    fn test_ingress_first_rule_and_path() {
        let raw: networkingv1::Ingress = serde_json::from_value(json!({
            "metadata": {"name": "web", "namespace": "apps"},
            "spec": {"rules": [
                {"host": "web.example.com", "http": {"paths": [
                    {"path": "/", "pathType": "Prefix",
                     "backend": {"service": {"name": "web", "port": {"number": 80}}}},
                    {"path": "/api", "pathType": "Prefix",
                     "backend": {"service": {"name": "api", "port": {"name": "http"}}}}
                ]}},
                {"host": "other.example.com"}
            ]}
        }))
        .unwrap();

        let model = ingress(&raw);
        assert_eq!(model.host, "web.example.com");
        assert_eq!(model.path, "/");
        assert_eq!(model.service_name, "web");
        assert_eq!(model.service_port, "80");
    }

    #[test]
    fn test_ingress_without_rules() {
        let raw: networkingv1::Ingress =
            serde_json::from_value(json!({"metadata": {"name": "empty", "namespace": "apps"}}))
                .unwrap();
        let model = ingress(&raw);
        assert!(model.host.is_empty());
        assert!(model.meta.state.is_ready());
    }

    #[test]
    fn test_secret_data_is_decoded() {
        let raw: corev1::Secret = serde_json::from_value(json!({
            "metadata": {"name": "creds", "namespace": "apps"},
            "type": "Opaque",
            "data": {"password": "aHVudGVyMg=="}
        }))
        .unwrap();
        let model = secret(&raw);
        assert_eq!(model.data["password"], "hunter2");
        assert_eq!(model.secret_type, "Opaque");
    }

    #[test]
    fn test_pvc_fields() {
        let raw: corev1::PersistentVolumeClaim = serde_json::from_value(json!({
            "metadata": {"name": "data-0", "namespace": "apps"},
            "spec": {"storageClassName": "silver", "volumeName": "pv-1",
                     "accessModes": ["ReadWriteOnce"], "volumeMode": "Filesystem"},
            "status": {"phase": "Bound", "capacity": {"storage": "10Gi"}}
        }))
        .unwrap();
        let model = persistent_volume_claim(&raw);
        assert_eq!(model.meta.state.status, Status::Ready);
        assert_eq!(model.storage_class, "silver");
        assert_eq!(model.capacity, "10Gi");
        assert_eq!(model.access_modes, vec!["ReadWriteOnce"]);
    }

    #[test]
    fn test_resource_quota_maps() {
        let raw: corev1::ResourceQuota = serde_json::from_value(json!({
            "metadata": {"name": "quota", "namespace": "team-a"},
            "spec": {"hard": {"pods": "10", "limits.cpu": "4"}},
            "status": {"used": {"pods": "3"}}
        }))
        .unwrap();
        let model = resource_quota(&raw);
        assert_eq!(model.resource_limits["limits.cpu"], "4");
        assert_eq!(model.resource_used["pods"], "3");
        assert!(!model.resource_used.contains_key("limits.cpu"));
    }
}
