//! Resource models
//!
//! One struct per supported kind plus the [`Resource`] tagged union that
//! the cache hands out. Every modelled variant embeds a [`Meta`] carrying identity
//! and the derived [`State`].

use super::kind::ResourceKind;
use super::resource_set::ResourceSet;
use super::state::{State, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static UNKNOWN_STATE: LazyLock<State> =
    LazyLock::new(|| State::new(Status::Unknown, "", ""));

/// Identity plus current derived state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub name: String,
    pub namespace: String,
    pub kind: ResourceKind,
    pub state: State,
}

impl Meta {
    pub fn new(kind: ResourceKind, namespace: &str, name: &str, state: State) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            kind,
            state,
        }
    }

    /// Meta for a resource that is absent from the cluster
    pub fn not_found(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        Self::new(kind, namespace, name, State::not_found())
    }
}

/// Reference to a resource by kind and coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Container summary inside a pod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: ContainerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContainerStatus {
    Running,
    Waiting,
    Terminated,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerState {
    pub status: ContainerStatus,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub host_ip: String,
    pub pod_ip: String,
    pub containers: Vec<Container>,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub expected_replicas: i32,
    pub updated_replicas: i32,
    pub current_replicas: i32,
    pub available_replicas: i32,
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSet {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub expected_replicas: i32,
    pub ready_replicas: i32,
    pub updated_replicas: i32,
    /// Partition of a RollingUpdate strategy, if one is configured
    pub partition: Option<i32>,
    pub current_version: String,
    pub update_version: String,
    pub selector: String,
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSet {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub desired_number_scheduled: i32,
    pub updated_number_scheduled: i32,
    pub number_available: i32,
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub expected_completion: i32,
    pub succeeded: i32,
    pub failed: i32,
    pub active: i32,
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub name: String,
    pub protocol: String,
    pub port: i32,
    pub target_port: String,
    pub node_port: i32,
    /// Resolved `host:port` pairs from the service's Endpoints
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(flatten)]
    pub meta: Meta,
    pub ports: Vec<ServicePort>,
    pub cluster_ip: String,
    pub service_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    #[serde(flatten)]
    pub meta: Meta,
    pub host: String,
    pub path: String,
    pub service_name: String,
    pub service_port: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    #[serde(flatten)]
    pub meta: Meta,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(flatten)]
    pub meta: Meta,
    pub data: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub secret_type: String,
}

/// CPU in cores, memory in Mi
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeResourceInfo {
    pub cpu: f64,
    pub memory: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyUnitNodeResourceInfo {
    pub capacity: NodeResourceInfo,
    pub allocatable: NodeResourceInfo,
    pub requests_allocated: NodeResourceInfo,
    pub limits_allocated: NodeResourceInfo,
}

/// Local volume pool advertised by a node, sizes in kb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpDriveStorage {
    pub pool_name: String,
    pub storage_left: i64,
    pub storage_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub node_ip: String,
    pub capacity: BTreeMap<String, String>,
    pub allocatable: BTreeMap<String, String>,
    pub requests_allocated: BTreeMap<String, String>,
    pub limits_allocated: BTreeMap<String, String>,
    pub warp_drive_storage_list: Vec<WarpDriveStorage>,
    pub unify_unit_resource_info: UnifyUnitNodeResourceInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    #[serde(flatten)]
    pub meta: Meta,
    pub storage_class: String,
    pub volume_name: String,
    pub capacity: String,
    pub access_modes: Vec<String>,
    pub volume_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass {
    #[serde(flatten)]
    pub meta: Meta,
    pub provisioner: String,
    pub reclaim_policy: String,
    pub allow_volume_expansion: bool,
    pub volume_binding_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuota {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(rename = "limits")]
    pub resource_limits: BTreeMap<String, String>,
    #[serde(rename = "used")]
    pub resource_used: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub config_values: Map<String, Value>,
    pub dependencies_config_values: Map<String, Value>,
    /// Local alias of a dependency mapped to `name` or `namespace.name`
    pub dependencies: BTreeMap<String, String>,
    pub chart_name: String,
    pub chart_version: String,
    pub chart_app_version: String,
    pub output_config: Map<String, Value>,
    pub repo: String,
    pub chart_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInstance {
    #[serde(flatten)]
    pub meta: Meta,
    pub labels: BTreeMap<String, String>,
    pub application_name: String,
    pub application_version: String,
    pub instance_id: String,
    pub modules: ResourceSet,
}

/// Placeholder returned for kinds the cache has no getter for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultResource {
    /// Kind name as requested
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub state: State,
}

impl DefaultResource {
    pub fn unsupported(kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            state: State::new(
                Status::Unknown,
                "NotSupportedKind",
                format!("kind {} is not supported", kind),
            ),
        }
    }
}

/// Any resource the cache can return
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    DaemonSet(DaemonSet),
    Job(Job),
    Service(Service),
    Ingress(Ingress),
    ConfigMap(ConfigMap),
    Secret(Secret),
    Pod(Pod),
    Node(Node),
    PersistentVolumeClaim(PersistentVolumeClaim),
    StorageClass(StorageClass),
    Namespace(Namespace),
    ResourceQuota(ResourceQuota),
    ReleaseConfig(ReleaseConfig),
    ApplicationInstance(ApplicationInstance),
    Default(DefaultResource),
}

impl Resource {
    /// Identity of a modelled kind; `None` for [`DefaultResource`]
    pub fn meta(&self) -> Option<&Meta> {
        let meta = match self {
            Resource::Deployment(r) => &r.meta,
            Resource::StatefulSet(r) => &r.meta,
            Resource::DaemonSet(r) => &r.meta,
            Resource::Job(r) => &r.meta,
            Resource::Service(r) => &r.meta,
            Resource::Ingress(r) => &r.meta,
            Resource::ConfigMap(r) => &r.meta,
            Resource::Secret(r) => &r.meta,
            Resource::Pod(r) => &r.meta,
            Resource::Node(r) => &r.meta,
            Resource::PersistentVolumeClaim(r) => &r.meta,
            Resource::StorageClass(r) => &r.meta,
            Resource::Namespace(r) => &r.meta,
            Resource::ResourceQuota(r) => &r.meta,
            Resource::ReleaseConfig(r) => &r.meta,
            Resource::ApplicationInstance(r) => &r.meta,
            Resource::Default(_) => return None,
        };
        Some(meta)
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        self.meta().map(|m| m.kind)
    }

    /// Kind name, including kinds the cache does not model
    pub fn kind_name(&self) -> &str {
        match (self, self.meta()) {
            (Resource::Default(r), _) => &r.kind,
            (_, Some(meta)) => meta.kind.as_str(),
            (_, None) => "",
        }
    }

    pub fn name(&self) -> &str {
        match (self, self.meta()) {
            (Resource::Default(r), _) => &r.name,
            (_, Some(meta)) => &meta.name,
            (_, None) => "",
        }
    }

    pub fn namespace(&self) -> &str {
        match (self, self.meta()) {
            (Resource::Default(r), _) => &r.namespace,
            (_, Some(meta)) => &meta.namespace,
            (_, None) => "",
        }
    }

    pub fn state(&self) -> &State {
        match (self, self.meta()) {
            (Resource::Default(r), _) => &r.state,
            (_, Some(meta)) => &meta.state,
            (_, None) => &UNKNOWN_STATE,
        }
    }

    /// Move this resource into the matching slot of a set
    ///
    /// Kinds that are not application members (pods, nodes, storage,
    /// tenants, custom resources) are silently ignored.
    pub fn add_to_resource_set(self, set: &mut ResourceSet) {
        match self {
            Resource::Deployment(r) => set.deployments.push(r),
            Resource::StatefulSet(r) => set.stateful_sets.push(r),
            Resource::DaemonSet(r) => set.daemon_sets.push(r),
            Resource::Job(r) => set.jobs.push(r),
            Resource::Service(r) => set.services.push(r),
            Resource::Ingress(r) => set.ingresses.push(r),
            Resource::ConfigMap(r) => set.config_maps.push(r),
            Resource::Secret(r) => set.secrets.push(r),
            Resource::Pod(_)
            | Resource::Node(_)
            | Resource::PersistentVolumeClaim(_)
            | Resource::StorageClass(_)
            | Resource::Namespace(_)
            | Resource::ResourceQuota(_)
            | Resource::ReleaseConfig(_)
            | Resource::ApplicationInstance(_)
            | Resource::Default(_) => {}
        }
    }

    /// Synthetic resource of the given kind in the `NotFound` state
    pub fn not_found(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        let meta = Meta::not_found(kind, namespace, name);
        match kind {
            ResourceKind::Deployment => Resource::Deployment(Deployment {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                expected_replicas: 0,
                updated_replicas: 0,
                current_replicas: 0,
                available_replicas: 0,
                pods: Vec::new(),
            }),
            ResourceKind::StatefulSet => Resource::StatefulSet(StatefulSet {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                expected_replicas: 0,
                ready_replicas: 0,
                updated_replicas: 0,
                partition: None,
                current_version: String::new(),
                update_version: String::new(),
                selector: String::new(),
                pods: Vec::new(),
            }),
            ResourceKind::DaemonSet => Resource::DaemonSet(DaemonSet {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                desired_number_scheduled: 0,
                updated_number_scheduled: 0,
                number_available: 0,
                pods: Vec::new(),
            }),
            ResourceKind::Job => Resource::Job(Job {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                expected_completion: 0,
                succeeded: 0,
                failed: 0,
                active: 0,
                pods: Vec::new(),
            }),
            ResourceKind::Service => Resource::Service(Service {
                meta,
                ports: Vec::new(),
                cluster_ip: String::new(),
                service_type: String::new(),
            }),
            ResourceKind::Ingress => Resource::Ingress(Ingress {
                meta,
                host: String::new(),
                path: String::new(),
                service_name: String::new(),
                service_port: String::new(),
            }),
            ResourceKind::ConfigMap => Resource::ConfigMap(ConfigMap {
                meta,
                data: BTreeMap::new(),
            }),
            ResourceKind::Secret => Resource::Secret(Secret {
                meta,
                data: BTreeMap::new(),
                secret_type: String::new(),
            }),
            ResourceKind::Pod => Resource::Pod(Pod {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                host_ip: String::new(),
                pod_ip: String::new(),
                containers: Vec::new(),
                age: String::new(),
            }),
            ResourceKind::Node => Resource::Node(Node {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                node_ip: String::new(),
                capacity: BTreeMap::new(),
                allocatable: BTreeMap::new(),
                requests_allocated: BTreeMap::new(),
                limits_allocated: BTreeMap::new(),
                warp_drive_storage_list: Vec::new(),
                unify_unit_resource_info: UnifyUnitNodeResourceInfo::default(),
            }),
            ResourceKind::PersistentVolumeClaim => {
                Resource::PersistentVolumeClaim(PersistentVolumeClaim {
                    meta,
                    storage_class: String::new(),
                    volume_name: String::new(),
                    capacity: String::new(),
                    access_modes: Vec::new(),
                    volume_mode: String::new(),
                })
            }
            ResourceKind::StorageClass => Resource::StorageClass(StorageClass {
                meta,
                provisioner: String::new(),
                reclaim_policy: String::new(),
                allow_volume_expansion: false,
                volume_binding_mode: String::new(),
            }),
            ResourceKind::Namespace => Resource::Namespace(Namespace {
                meta,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
            }),
            ResourceKind::ResourceQuota => Resource::ResourceQuota(ResourceQuota {
                meta,
                resource_limits: BTreeMap::new(),
                resource_used: BTreeMap::new(),
            }),
            ResourceKind::ReleaseConfig => Resource::ReleaseConfig(ReleaseConfig {
                meta,
                labels: BTreeMap::new(),
                config_values: Map::new(),
                dependencies_config_values: Map::new(),
                dependencies: BTreeMap::new(),
                chart_name: String::new(),
                chart_version: String::new(),
                chart_app_version: String::new(),
                output_config: Map::new(),
                repo: String::new(),
                chart_image: String::new(),
            }),
            ResourceKind::ApplicationInstance => {
                Resource::ApplicationInstance(ApplicationInstance {
                    meta,
                    labels: BTreeMap::new(),
                    application_name: String::new(),
                    application_version: String::new(),
                    instance_id: String::new(),
                    modules: ResourceSet::default(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_kind_and_coordinates() {
        for kind in ResourceKind::all() {
            let resource = Resource::not_found(*kind, "ns", "missing");
            assert_eq!(resource.kind(), Some(*kind));
            assert_eq!(resource.kind_name(), kind.as_str());
            assert_eq!(resource.namespace(), "ns");
            assert_eq!(resource.name(), "missing");
            assert_eq!(resource.state().status, Status::NotFound);
        }
    }

    #[test]
    fn test_unsupported_kind_placeholder() {
        let resource = Resource::Default(DefaultResource::unsupported("CronJob", "ns", "nightly"));
        assert_eq!(resource.kind(), None);
        assert_eq!(resource.kind_name(), "CronJob");
        assert_eq!(resource.name(), "nightly");
        assert_eq!(resource.state().status, Status::Unknown);
        assert_eq!(resource.state().reason, "NotSupportedKind");
    }

    #[test]
    fn test_add_to_resource_set_routes_by_kind() {
        let mut set = ResourceSet::default();
        Resource::not_found(ResourceKind::Secret, "ns", "s").add_to_resource_set(&mut set);
        Resource::not_found(ResourceKind::Job, "ns", "j").add_to_resource_set(&mut set);
        Resource::not_found(ResourceKind::Pod, "ns", "p").add_to_resource_set(&mut set);
        Resource::not_found(ResourceKind::Node, "", "n").add_to_resource_set(&mut set);

        assert_eq!(set.secrets.len(), 1);
        assert_eq!(set.jobs.len(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_flattened_meta_serialization() {
        let resource = Resource::not_found(ResourceKind::Secret, "ns", "s");
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["kind"], "Secret");
        assert_eq!(json["state"]["status"], "NotFound");
        assert_eq!(json["type"], "");
    }
}
