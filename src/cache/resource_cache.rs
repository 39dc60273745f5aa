use super::client::ClusterApi;
use super::handler::{HandlerRegistry, ReleaseConfigHandler};
use super::lister::Listers;
use crate::convert;
use crate::error::CacheError;
use crate::models::crd;
use crate::models::{
    ApplicationInstance, DaemonSet, DefaultResource, Deployment, EventList, Job, Node,
    PersistentVolumeClaim, Pod, ReleaseConfig, Resource, ResourceKind, ResourceRef, ResourceSet,
    Secret, Service, StatefulSet, StorageClass, TenantInfo, TenantInfoList,
};
use crate::selector::Selector;
use futures::{StreamExt, stream};
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::batch::v1 as batchv1;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const DEFAULT_NODE_CONCURRENCY: usize = 8;

/// Outcome of a tolerant lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Resource),
    /// Absent from the cluster; carries a placeholder in the `NotFound` state
    Missing(Resource),
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_resource(self) -> Resource {
        match self {
            Lookup::Found(resource) | Lookup::Missing(resource) => resource,
        }
    }
}

/// Kind-polymorphic read access to the cluster
///
/// Reads go through the watch-fed listers and derive state on every call.
/// Only pod events, pod logs and per-node pod listings hit the API server.
#[derive(Clone)]
pub struct ResourceCache {
    listers: Listers,
    api: Arc<dyn ClusterApi>,
    handlers: HandlerRegistry,
    node_concurrency: usize,
}

impl ResourceCache {
    pub fn new(listers: Listers, api: Arc<dyn ClusterApi>, handlers: HandlerRegistry) -> Self {
        Self {
            listers,
            api,
            handlers,
            node_concurrency: DEFAULT_NODE_CONCURRENCY,
        }
    }

    /// Bound the number of nodes summarised concurrently by [`get_nodes`](Self::get_nodes)
    pub fn with_node_concurrency(mut self, concurrency: usize) -> Self {
        self.node_concurrency = concurrency.max(1);
        self
    }

    /// Look up one resource, returning a placeholder when it is absent
    pub fn lookup_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup, CacheError> {
        let ns = Some(namespace);
        let found = match kind {
            ResourceKind::Deployment => match self.listers.deployments.get(ns, name) {
                Some(d) => Some(Resource::Deployment(self.deployment(&d)?)),
                None => None,
            },
            ResourceKind::StatefulSet => match self.listers.stateful_sets.get(ns, name) {
                Some(s) => Some(Resource::StatefulSet(self.stateful_set(&s)?)),
                None => None,
            },
            ResourceKind::DaemonSet => match self.listers.daemon_sets.get(ns, name) {
                Some(d) => Some(Resource::DaemonSet(self.daemon_set(&d)?)),
                None => None,
            },
            ResourceKind::Job => match self.listers.jobs.get(ns, name) {
                Some(j) => Some(Resource::Job(self.job(&j)?)),
                None => None,
            },
            ResourceKind::Pod => self
                .listers
                .pods
                .get(ns, name)
                .map(|p| Resource::Pod(convert::pod(&p))),
            ResourceKind::Service => self
                .listers
                .services
                .get(ns, name)
                .map(|s| Resource::Service(self.service(&s))),
            ResourceKind::Ingress => self
                .listers
                .ingresses
                .get(ns, name)
                .map(|i| Resource::Ingress(convert::ingress(&i))),
            ResourceKind::ConfigMap => self
                .listers
                .config_maps
                .get(ns, name)
                .map(|c| Resource::ConfigMap(convert::config_map(&c))),
            ResourceKind::Secret => self
                .listers
                .secrets
                .get(ns, name)
                .map(|s| Resource::Secret(convert::secret(&s))),
            ResourceKind::Node => self
                .listers
                .nodes
                .get(None, name)
                .map(|n| Resource::Node(convert::node(&n, &self.cached_pods_on_node(name)))),
            ResourceKind::Namespace => self
                .listers
                .namespaces
                .get(None, name)
                .map(|n| Resource::Namespace(convert::namespace(&n))),
            ResourceKind::ResourceQuota => self
                .listers
                .resource_quotas
                .get(ns, name)
                .map(|q| Resource::ResourceQuota(convert::resource_quota(&q))),
            ResourceKind::PersistentVolumeClaim => self
                .listers
                .persistent_volume_claims
                .get(ns, name)
                .map(|p| Resource::PersistentVolumeClaim(convert::persistent_volume_claim(&p))),
            ResourceKind::StorageClass => self
                .listers
                .storage_classes
                .get(None, name)
                .map(|s| Resource::StorageClass(convert::storage_class(&s))),
            ResourceKind::ReleaseConfig => self
                .listers
                .release_configs
                .get(ns, name)
                .map(|r| Resource::ReleaseConfig(convert::release_config(&r))),
            ResourceKind::ApplicationInstance => {
                match self.listers.application_instances.get(ns, name) {
                    Some(i) => Some(Resource::ApplicationInstance(
                        self.application_instance(&i)?,
                    )),
                    None => None,
                }
            }
        };

        Ok(match found {
            Some(resource) => Lookup::Found(resource),
            None => {
                let namespace = if kind.is_cluster_scoped() { "" } else { namespace };
                warn!(kind = %kind, namespace = %namespace, name = %name, "Resource is not found");
                Lookup::Missing(Resource::not_found(kind, namespace, name))
            }
        })
    }

    /// Look up one resource; absence is an error
    pub fn get_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Resource, CacheError> {
        match self.lookup_resource(kind, namespace, name)? {
            Lookup::Found(resource) => Ok(resource),
            Lookup::Missing(_) => Err(CacheError::not_found(kind, namespace, name)),
        }
    }

    /// Look up a resource by kind name
    ///
    /// A kind this cache does not model yields a `DefaultResource` in the
    /// `Unknown` state rather than an error.
    pub fn lookup_resource_by_kind_name(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Lookup, CacheError> {
        match ResourceKind::from_str_case_insensitive(kind) {
            Some(kind) => self.lookup_resource(kind, namespace, name),
            None => {
                debug!(kind = %kind, namespace = %namespace, name = %name, "Kind is not supported");
                Ok(Lookup::Found(Resource::Default(DefaultResource::unsupported(
                    kind, namespace, name,
                ))))
            }
        }
    }

    /// Build the picture of an application from its member references
    ///
    /// Missing members are included in the `NotFound` state; any other
    /// failure aborts the whole set. References to kinds a set cannot hold
    /// are skipped without a lookup, so an instance listing itself or
    /// another instance never recurses.
    pub fn get_resource_set(&self, refs: &[ResourceRef]) -> Result<ResourceSet, CacheError> {
        let mut set = ResourceSet::new();
        for reference in refs {
            if !reference.kind.is_set_member() {
                debug!(
                    kind = %reference.kind,
                    namespace = %reference.namespace,
                    name = %reference.name,
                    "Skipping reference to a kind outside resource sets"
                );
                continue;
            }
            let lookup = self
                .lookup_resource(reference.kind, &reference.namespace, &reference.name)
                .inspect_err(|e| {
                    error!(
                        kind = %reference.kind,
                        namespace = %reference.namespace,
                        name = %reference.name,
                        "Failed to get resource: {}", e
                    )
                })?;
            lookup.into_resource().add_to_resource_set(&mut set);
        }
        Ok(set)
    }

    pub fn list_secrets(
        &self,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<Secret>, CacheError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .listers
            .secrets
            .list(namespace, &selector)
            .iter()
            .map(|s| convert::secret(s))
            .collect())
    }

    pub fn list_stateful_sets(
        &self,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<StatefulSet>, CacheError> {
        let selector = parse_selector(selector)?;
        self.listers
            .stateful_sets
            .list(namespace, &selector)
            .iter()
            .map(|s| self.stateful_set(s))
            .collect()
    }

    pub fn list_persistent_volume_claims(
        &self,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, CacheError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .listers
            .persistent_volume_claims
            .list(namespace, &selector)
            .iter()
            .map(|p| convert::persistent_volume_claim(p))
            .collect())
    }

    pub fn list_storage_classes(&self, selector: &str) -> Result<Vec<StorageClass>, CacheError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .listers
            .storage_classes
            .list(None, &selector)
            .iter()
            .map(|s| convert::storage_class(s))
            .collect())
    }

    pub fn list_release_configs(
        &self,
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<Vec<ReleaseConfig>, CacheError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .listers
            .release_configs
            .list(namespace, &selector)
            .iter()
            .map(|r| convert::release_config(r))
            .collect())
    }

    /// Summaries of all nodes matching `selector`, in lister order
    ///
    /// Pods are fetched per node with bounded concurrency. Every node is
    /// processed; the error of the first failing node is returned.
    pub async fn get_nodes(&self, selector: &str) -> Result<Vec<Node>, CacheError> {
        let selector = parse_selector(selector)?;
        let nodes = self.listers.nodes.list(None, &selector);

        let results: Vec<Result<Node, CacheError>> = stream::iter(nodes)
            .map(|node| {
                let api = self.api.clone();
                async move {
                    let name = node.name_any();
                    let pods = api.pods_on_node(&name).await.inspect_err(|e| {
                        error!(node = %name, "Failed to list pods on node: {}", e)
                    })?;
                    Ok(convert::node(&node, &pods))
                }
            })
            .buffered(self.node_concurrency)
            .collect()
            .await;

        results.into_iter().collect()
    }

    pub fn list_tenants(&self, selector: &str) -> Result<TenantInfoList, CacheError> {
        let selector = parse_selector(selector)?;
        let items = self
            .listers
            .namespaces
            .list(None, &selector)
            .iter()
            .map(|ns| self.tenant_info(ns))
            .collect();
        Ok(TenantInfoList { items })
    }

    pub fn get_tenant(&self, name: &str) -> Result<TenantInfo, CacheError> {
        match self.listers.namespaces.get(None, name) {
            Some(namespace) => Ok(self.tenant_info(&namespace)),
            None => {
                warn!(tenant = %name, "Tenant namespace is not found");
                Err(CacheError::not_found(ResourceKind::Namespace, "", name))
            }
        }
    }

    /// Events of a cached pod, oldest first
    pub async fn get_pod_event_list(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<EventList, CacheError> {
        let pod = self
            .listers
            .pods
            .get(Some(namespace), name)
            .ok_or_else(|| CacheError::not_found(ResourceKind::Pod, namespace, name))?;
        let uid = pod.metadata.uid.clone().unwrap_or_default();

        let events = self
            .api
            .search_pod_events(namespace, name, &uid)
            .await
            .inspect_err(|e| {
                error!(namespace = %namespace, pod = %name, "Failed to search events: {}", e)
            })?;
        Ok(convert::event_list(events))
    }

    /// Logs of a pod; empty `container` and non-positive `tail_lines` use server defaults
    pub async fn get_pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String, CacheError> {
        let container = (!container.is_empty()).then(|| container.to_string());
        let tail_lines = (tail_lines > 0).then_some(tail_lines);
        let logs = self
            .api
            .pod_logs(namespace, pod, container, tail_lines)
            .await
            .inspect_err(|e| {
                error!(namespace = %namespace, pod = %pod, "Failed to get pod logs: {}", e)
            })?;
        Ok(logs)
    }

    /// Subscribe to ReleaseConfig add, update and delete events
    pub fn add_release_config_handler(&self, handler: Arc<dyn ReleaseConfigHandler>) {
        self.handlers.add(handler);
    }

    pub fn remove_release_config_handler(&self, handler: &Arc<dyn ReleaseConfigHandler>) {
        self.handlers.remove(handler);
    }

    fn pods_matching(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<Pod>, CacheError> {
        let Some(selector) = selector else {
            return Ok(Vec::new());
        };
        let selector =
            Selector::from_label_selector(selector).map_err(|e| CacheError::Conversion {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(self
            .listers
            .pods
            .list(Some(namespace), &selector)
            .iter()
            .map(|p| convert::pod(p))
            .collect())
    }

    fn deployment(&self, deployment: &appsv1::Deployment) -> Result<Deployment, CacheError> {
        let (namespace, name) = coordinates(deployment);
        let pods = self.pods_matching(
            ResourceKind::Deployment,
            &namespace,
            &name,
            deployment.spec.as_ref().map(|s| &s.selector),
        )?;
        Ok(convert::deployment(deployment, pods))
    }

    fn stateful_set(&self, stateful_set: &appsv1::StatefulSet) -> Result<StatefulSet, CacheError> {
        let (namespace, name) = coordinates(stateful_set);
        let pods = self.pods_matching(
            ResourceKind::StatefulSet,
            &namespace,
            &name,
            stateful_set.spec.as_ref().map(|s| &s.selector),
        )?;
        convert::stateful_set(stateful_set, pods).map_err(|e| CacheError::Conversion {
            kind: ResourceKind::StatefulSet,
            namespace,
            name,
            message: e.to_string(),
        })
    }

    fn daemon_set(&self, daemon_set: &appsv1::DaemonSet) -> Result<DaemonSet, CacheError> {
        let (namespace, name) = coordinates(daemon_set);
        let pods = self.pods_matching(
            ResourceKind::DaemonSet,
            &namespace,
            &name,
            daemon_set.spec.as_ref().map(|s| &s.selector),
        )?;
        Ok(convert::daemon_set(daemon_set, pods))
    }

    fn job(&self, job: &batchv1::Job) -> Result<Job, CacheError> {
        let (namespace, name) = coordinates(job);
        let pods = self.pods_matching(
            ResourceKind::Job,
            &namespace,
            &name,
            job.spec.as_ref().and_then(|s| s.selector.as_ref()),
        )?;
        Ok(convert::job(job, pods))
    }

    fn service(&self, service: &corev1::Service) -> Service {
        let (namespace, name) = coordinates(service);
        let endpoints = self.listers.endpoints.get(Some(&namespace), &name);
        convert::service(service, endpoints.as_deref())
    }

    fn application_instance(
        &self,
        instance: &crd::ApplicationInstance,
    ) -> Result<ApplicationInstance, CacheError> {
        let refs = convert::instance_module_refs(instance);
        let modules = self.get_resource_set(&refs)?;
        Ok(convert::application_instance(instance, modules))
    }

    /// Pods bound to `node` that still hold resources
    fn cached_pods_on_node(&self, node: &str) -> Vec<corev1::Pod> {
        self.listers
            .pods
            .list(None, &Selector::everything())
            .iter()
            .filter(|p| p.spec.as_ref().and_then(|s| s.node_name.as_deref()) == Some(node))
            .filter(|p| {
                let phase = p.status.as_ref().and_then(|s| s.phase.as_deref());
                !matches!(phase, Some("Succeeded") | Some("Failed"))
            })
            .map(|p| p.as_ref().clone())
            .collect()
    }

    fn tenant_info(&self, namespace: &corev1::Namespace) -> TenantInfo {
        let name = namespace.name_any();
        let quotas: Vec<_> = self
            .listers
            .resource_quotas
            .list(Some(&name), &Selector::everything())
            .iter()
            .map(|q| convert::resource_quota(q))
            .collect();
        convert::tenant_info(namespace, &quotas)
    }
}

fn coordinates<K: ResourceExt>(obj: &K) -> (String, String) {
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

fn parse_selector(selector: &str) -> Result<Selector, CacheError> {
    selector.parse::<Selector>().map_err(|e| {
        error!("Failed to parse label selector: {}", e);
        CacheError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::client::MockClusterApi;
    use crate::cache::lister::Lister;
    use crate::models::Status;
    use kube::runtime::reflector::{self, Store};
    use kube::runtime::watcher;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use std::hash::Hash;

    fn store<K>(objects: Vec<Value>) -> Arc<dyn Lister<K>>
    where
        K: kube::Resource + Clone + DeserializeOwned + Send + Sync + 'static,
        K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
    {
        let (reader, mut writer) = reflector::store();
        for object in objects {
            let obj: K = serde_json::from_value(object).unwrap();
            writer.apply_watcher_event(&watcher::Event::Apply(obj));
        }
        let reader: Store<K> = reader;
        Arc::new(reader)
    }

    fn running_pod(name: &str, app: &str, node: &str) -> Value {
        json!({
            "metadata": {"name": name, "namespace": "ns", "labels": {"app": app}},
            "spec": {"nodeName": node, "containers": [{"name": "main"}]},
            "status": {
                "phase": "Running",
                "conditions": [{"type": "Ready", "status": "True"}],
                "containerStatuses": [{
                    "name": "main", "image": "img", "imageID": "", "ready": true,
                    "restartCount": 0, "state": {"running": {}}
                }]
            }
        })
    }

    fn cache(listers: Listers, api: MockClusterApi) -> ResourceCache {
        ResourceCache::new(listers, Arc::new(api), HandlerRegistry::new())
    }

    fn listers() -> Listers {
        let mut listers = Listers::default();
        listers.pods = store(vec![
            running_pod("web-0", "web", "n1"),
            running_pod("db-0", "db", "n2"),
        ]);
        listers.deployments = store(vec![json!({
            "metadata": {"name": "web", "namespace": "ns", "generation": 1},
            "spec": {
                "replicas": 1,
                "selector": {"matchLabels": {"app": "web"}},
                "template": {"spec": {"containers": []}}
            },
            "status": {
                "observedGeneration": 1, "replicas": 1, "updatedReplicas": 1,
                "readyReplicas": 1, "availableReplicas": 1
            }
        })]);
        listers.secrets = store(vec![
            json!({"metadata": {"name": "a", "namespace": "ns", "labels": {"tier": "x"}}}),
            json!({"metadata": {"name": "b", "namespace": "ns"}}),
        ]);
        listers.nodes = store(vec![
            json!({"metadata": {"name": "n1"}}),
            json!({"metadata": {"name": "n2"}}),
        ]);
        listers.namespaces = store(vec![json!({
            "metadata": {"name": "ns"},
            "status": {"phase": "Active"}
        })]);
        listers
    }

    #[test]
    fn test_deployment_collects_selected_pods() {
        let cache = cache(listers(), MockClusterApi::new());
        let resource = cache
            .get_resource(ResourceKind::Deployment, "ns", "web")
            .unwrap();
        let Resource::Deployment(deployment) = resource else {
            panic!("expected a deployment");
        };
        assert_eq!(deployment.pods.len(), 1);
        assert_eq!(deployment.pods[0].meta.name, "web-0");
        assert_eq!(deployment.expected_replicas, 1);
    }

    #[test]
    fn test_missing_resource_is_placeholder_or_error() {
        let cache = cache(listers(), MockClusterApi::new());

        let lookup = cache
            .lookup_resource(ResourceKind::ConfigMap, "ns", "absent")
            .unwrap();
        assert!(!lookup.is_found());
        let placeholder = lookup.into_resource();
        assert_eq!(placeholder.kind(), Some(ResourceKind::ConfigMap));
        assert_eq!(placeholder.state().status, Status::NotFound);

        let err = cache
            .get_resource(ResourceKind::ConfigMap, "ns", "absent")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unsupported_kind_is_not_an_error() {
        let cache = cache(listers(), MockClusterApi::new());
        let resource = cache
            .lookup_resource_by_kind_name("CronJob", "ns", "nightly")
            .unwrap()
            .into_resource();
        assert_eq!(resource.kind_name(), "CronJob");
        assert_eq!(resource.state().status, Status::Unknown);
        assert_eq!(resource.state().reason, "NotSupportedKind");
    }

    #[test]
    fn test_resource_set_tolerates_missing_members() {
        let cache = cache(listers(), MockClusterApi::new());
        let set = cache
            .get_resource_set(&[
                ResourceRef::new(ResourceKind::Deployment, "ns", "web"),
                ResourceRef::new(ResourceKind::Service, "ns", "web"),
                ResourceRef::new(ResourceKind::Pod, "ns", "web-0"),
            ])
            .unwrap();
        assert_eq!(set.deployments.len(), 1);
        assert_eq!(set.services.len(), 1);
        assert_eq!(set.services[0].meta.state.status, Status::NotFound);
        // pods are not application members
        assert_eq!(set.len(), 2);
    }

    fn instance(name: &str, modules: Value) -> Value {
        json!({
            "apiVersion": "transwarp.k8s.io/v1beta1",
            "kind": "ApplicationInstance",
            "metadata": {"name": name, "namespace": "ns"},
            "spec": {"applicationRef": {"name": name, "version": "1"}},
            "status": {"ready": true, "modules": modules}
        })
    }

    #[test]
    fn test_instances_referencing_instances_do_not_recurse() {
        let mut listers = listers();
        listers.application_instances = store(vec![
            instance(
                "self",
                json!([
                    {"resourceRef": {"kind": "ApplicationInstance", "name": "self"}},
                    {"resourceRef": {"kind": "Deployment", "name": "web"}}
                ]),
            ),
            instance(
                "a",
                json!([{"resourceRef": {"kind": "ApplicationInstance", "name": "b"}}]),
            ),
            instance(
                "b",
                json!([{"resourceRef": {"kind": "ApplicationInstance", "name": "a"}}]),
            ),
        ]);
        let cache = cache(listers, MockClusterApi::new());

        let resource = cache
            .get_resource(ResourceKind::ApplicationInstance, "ns", "self")
            .unwrap();
        let Resource::ApplicationInstance(looped) = resource else {
            panic!("expected an application instance");
        };
        assert_eq!(looped.modules.len(), 1);
        assert_eq!(looped.modules.deployments[0].meta.name, "web");

        for name in ["a", "b"] {
            let resource = cache
                .get_resource(ResourceKind::ApplicationInstance, "ns", name)
                .unwrap();
            let Resource::ApplicationInstance(cycled) = resource else {
                panic!("expected an application instance");
            };
            assert!(cycled.modules.is_empty());
        }
    }

    #[test]
    fn test_list_secrets_by_selector() {
        let cache = cache(listers(), MockClusterApi::new());
        let all = cache.list_secrets(Some("ns"), "").unwrap();
        assert_eq!(all.len(), 2);
        let tiered = cache.list_secrets(None, "tier=x").unwrap();
        assert_eq!(tiered.len(), 1);
        assert_eq!(tiered[0].meta.name, "a");

        let err = cache.list_secrets(None, "tier in (x").unwrap_err();
        assert!(matches!(err, CacheError::InvalidSelector(_)));
    }

    #[test]
    fn test_tenant_lookup() {
        let cache = cache(listers(), MockClusterApi::new());
        let tenant = cache.get_tenant("ns").unwrap();
        assert_eq!(tenant.tenant_name, "ns");
        assert!(tenant.ready);
        assert_eq!(cache.list_tenants("").unwrap().items.len(), 1);
        assert!(cache.get_tenant("other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_node_lookup_uses_cached_pods() {
        let cache = cache(listers(), MockClusterApi::new());
        let Resource::Node(node) = cache.get_resource(ResourceKind::Node, "ignored", "n1").unwrap()
        else {
            panic!("expected a node");
        };
        assert_eq!(node.meta.name, "n1");
        assert_eq!(node.meta.namespace, "");
    }

    #[tokio::test]
    async fn test_get_nodes_fetches_pods_per_node() {
        let mut api = MockClusterApi::new();
        api.expect_pods_on_node()
            .times(2)
            .returning(|_| Ok(Vec::new()));
        let cache = cache(listers(), api).with_node_concurrency(1);

        let nodes = cache.get_nodes("").await.unwrap();
        let names: Vec<_> = nodes.iter().map(|n| n.meta.name.as_str()).collect();
        assert_eq!(names, vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn test_get_nodes_reports_first_failure() {
        let mut api = MockClusterApi::new();
        api.expect_pods_on_node().returning(|node| {
            Err(kube::Error::ReadEvents(std::io::Error::other(format!(
                "{} down",
                node
            ))))
        });
        let cache = cache(listers(), api);

        let err = cache.get_nodes("").await.unwrap_err();
        assert!(matches!(err, CacheError::Kube(_)));
        let message = err.to_string();
        assert!(message.contains("n1 down"), "unexpected error: {}", message);
        assert!(!message.contains("n2 down"));
    }

    #[tokio::test]
    async fn test_pod_events_need_a_cached_pod() {
        let mut api = MockClusterApi::new();
        api.expect_search_pod_events()
            .withf(|ns, pod, _| ns == "ns" && pod == "web-0")
            .returning(|_, _, _| Ok(Vec::new()));
        let cache = cache(listers(), api);

        let events = cache.get_pod_event_list("ns", "web-0").await.unwrap();
        assert!(events.events.is_empty());

        let err = cache.get_pod_event_list("ns", "gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_pod_logs_map_defaults() {
        let mut api = MockClusterApi::new();
        api.expect_pod_logs()
            .withf(|_, _, container, tail| container.is_none() && tail.is_none())
            .returning(|_, _, _, _| Ok("line\n".to_string()));
        let cache = cache(listers(), api);

        let logs = cache.get_pod_logs("ns", "web-0", "", 0).await.unwrap();
        assert_eq!(logs, "line\n");
    }
}
