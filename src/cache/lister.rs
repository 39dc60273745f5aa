//! Read access to watch-fed object stores

use crate::models::crd;
use crate::selector::Selector;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::batch::v1 as batchv1;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::networking::v1 as networkingv1;
use k8s_openapi::api::storage::v1 as storagev1;
use kube::runtime::reflector::{self, ObjectRef, Store};
use kube::{Resource, ResourceExt};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Lookup and label-filtered listing of one kind
pub trait Lister<K>: Send + Sync {
    /// Object by name; `namespace` is `None` for cluster-scoped kinds
    fn get(&self, namespace: Option<&str>, name: &str) -> Option<Arc<K>>;

    /// Objects matching `selector`, across all namespaces when `namespace` is `None`
    ///
    /// Results are ordered by namespace, then name.
    fn list(&self, namespace: Option<&str>, selector: &Selector) -> Vec<Arc<K>>;
}

impl<K> Lister<K> for Store<K>
where
    K: Resource + Clone + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    fn get(&self, namespace: Option<&str>, name: &str) -> Option<Arc<K>> {
        let mut key = ObjectRef::<K>::new(name);
        if let Some(ns) = namespace {
            key = key.within(ns);
        }
        Store::get(self, &key)
    }

    fn list(&self, namespace: Option<&str>, selector: &Selector) -> Vec<Arc<K>> {
        let mut objects: Vec<Arc<K>> = self
            .state()
            .into_iter()
            .filter(|obj| namespace.is_none_or(|ns| obj.namespace().as_deref() == Some(ns)))
            .filter(|obj| selector.matches(obj.labels()))
            .collect();
        objects.sort_by_key(|obj| (obj.namespace(), obj.name_any()));
        objects
    }
}

/// Lister over a store that never receives objects
pub fn empty<K>() -> Arc<dyn Lister<K>>
where
    K: Resource + Clone + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    let (reader, _writer) = reflector::store::<K>();
    Arc::new(reader)
}

/// One lister per cached kind
#[derive(Clone)]
pub struct Listers {
    pub pods: Arc<dyn Lister<corev1::Pod>>,
    pub deployments: Arc<dyn Lister<appsv1::Deployment>>,
    pub stateful_sets: Arc<dyn Lister<appsv1::StatefulSet>>,
    pub daemon_sets: Arc<dyn Lister<appsv1::DaemonSet>>,
    pub jobs: Arc<dyn Lister<batchv1::Job>>,
    pub services: Arc<dyn Lister<corev1::Service>>,
    pub endpoints: Arc<dyn Lister<corev1::Endpoints>>,
    pub ingresses: Arc<dyn Lister<networkingv1::Ingress>>,
    pub config_maps: Arc<dyn Lister<corev1::ConfigMap>>,
    pub secrets: Arc<dyn Lister<corev1::Secret>>,
    pub nodes: Arc<dyn Lister<corev1::Node>>,
    pub namespaces: Arc<dyn Lister<corev1::Namespace>>,
    pub resource_quotas: Arc<dyn Lister<corev1::ResourceQuota>>,
    pub persistent_volume_claims: Arc<dyn Lister<corev1::PersistentVolumeClaim>>,
    pub storage_classes: Arc<dyn Lister<storagev1::StorageClass>>,
    pub release_configs: Arc<dyn Lister<crd::ReleaseConfig>>,
    pub application_instances: Arc<dyn Lister<crd::ApplicationInstance>>,
}

impl Default for Listers {
    fn default() -> Self {
        Self {
            pods: empty(),
            deployments: empty(),
            stateful_sets: empty(),
            daemon_sets: empty(),
            jobs: empty(),
            services: empty(),
            endpoints: empty(),
            ingresses: empty(),
            config_maps: empty(),
            secrets: empty(),
            nodes: empty(),
            namespaces: empty(),
            resource_quotas: empty(),
            persistent_volume_claims: empty(),
            storage_classes: empty(),
            release_configs: empty(),
            application_instances: empty(),
        }
    }
}

impl fmt::Debug for Listers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listers").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::runtime::watcher;
    use serde_json::json;

    fn store_with(pods: Vec<corev1::Pod>) -> Store<corev1::Pod> {
        let (reader, mut writer) = reflector::store();
        for pod in pods {
            writer.apply_watcher_event(&watcher::Event::Apply(pod));
        }
        reader
    }

    fn pod(namespace: &str, name: &str, app: &str) -> corev1::Pod {
        serde_json::from_value(json!({
            "metadata": {"name": name, "namespace": namespace, "labels": {"app": app}}
        }))
        .unwrap()
    }

    #[test]
    fn test_get_by_namespace_and_name() {
        let store = store_with(vec![pod("a", "web-0", "web"), pod("b", "web-0", "web")]);
        let lister: &dyn Lister<corev1::Pod> = &store;
        let found = lister.get(Some("b"), "web-0").unwrap();
        assert_eq!(found.namespace().as_deref(), Some("b"));
        assert!(lister.get(Some("c"), "web-0").is_none());
    }

    #[test]
    fn test_list_filters_and_orders() {
        let store = store_with(vec![
            pod("b", "web-1", "web"),
            pod("a", "db-0", "db"),
            pod("a", "web-0", "web"),
        ]);
        let lister: &dyn Lister<corev1::Pod> = &store;
        let selector: Selector = "app=web".parse().unwrap();

        let all: Vec<String> = lister
            .list(None, &selector)
            .iter()
            .map(|p| format!("{}/{}", p.namespace().unwrap_or_default(), p.name_any()))
            .collect();
        assert_eq!(all, vec!["a/web-0", "b/web-1"]);
        assert_eq!(lister.list(Some("a"), &Selector::everything()).len(), 2);
    }
}
