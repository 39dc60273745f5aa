use super::quantity::{self, ResourceList};
use super::{annotations_of, labels_of};
use crate::models::{
    Meta, Node, NodeResourceInfo, ResourceKind, UnifyUnitNodeResourceInfo, WarpDriveStorage,
};
use crate::status;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as KubeQuantity;
use kube::ResourceExt;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Node annotation listing local volume pools
const VOLUME_POOL_ANNOTATION: &str = "ResourceVolumePoolList";

#[derive(Debug, Deserialize)]
struct PoolResource {
    #[serde(rename = "PoolName", alias = "poolName", default)]
    pool_name: String,
    #[serde(rename = "SubPools", alias = "subPools", default)]
    sub_pools: BTreeMap<String, SubPool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubPool {
    #[serde(default)]
    size: i64,
    #[serde(default)]
    used_size: i64,
}

fn parse_list(list: Option<&BTreeMap<String, KubeQuantity>>) -> ResourceList {
    list.into_iter()
        .flatten()
        .map(|(name, q)| (name.clone(), quantity::parse_or_zero(&q.0)))
        .collect()
}

fn raw_map(list: Option<&BTreeMap<String, KubeQuantity>>) -> BTreeMap<String, String> {
    list.into_iter()
        .flatten()
        .map(|(name, q)| (name.clone(), q.0.clone()))
        .collect()
}

/// Total requests and limits of a pod spec
///
/// Regular containers are summed; each init container raises a resource
/// to at least its own value since init containers run one at a time.
pub fn pod_requests_and_limits(spec: &corev1::PodSpec) -> (ResourceList, ResourceList) {
    let mut requests = ResourceList::new();
    let mut limits = ResourceList::new();

    for container in &spec.containers {
        let resources = container.resources.as_ref();
        quantity::add_into(
            &mut requests,
            &parse_list(resources.and_then(|r| r.requests.as_ref())),
        );
        quantity::add_into(
            &mut limits,
            &parse_list(resources.and_then(|r| r.limits.as_ref())),
        );
    }

    for container in spec.init_containers.iter().flatten() {
        let resources = container.resources.as_ref();
        quantity::max_into(
            &mut requests,
            &parse_list(resources.and_then(|r| r.requests.as_ref())),
        );
        quantity::max_into(
            &mut limits,
            &parse_list(resources.and_then(|r| r.limits.as_ref())),
        );
    }

    (requests, limits)
}

fn node_resource_info(list: &BTreeMap<String, String>) -> NodeResourceInfo {
    NodeResourceInfo {
        cpu: list.get("cpu").map(|v| quantity::cpu_cores(v)).unwrap_or(0.0),
        memory: list.get("memory").map(|v| quantity::memory_mi(v)).unwrap_or(0),
    }
}

fn warp_drive_storage(node_name: &str, raw: &str) -> Vec<WarpDriveStorage> {
    match serde_json::from_str::<Vec<PoolResource>>(raw) {
        Ok(pools) => pools
            .into_iter()
            .map(|pool| WarpDriveStorage {
                pool_name: pool.pool_name,
                storage_left: pool.sub_pools.values().map(|s| s.size - s.used_size).sum(),
                storage_total: pool.sub_pools.values().map(|s| s.size).sum(),
            })
            .collect(),
        Err(e) => {
            warn!(node = %node_name, "Failed to parse volume pool list: {}", e);
            Vec::new()
        }
    }
}

/// Node summary with the resources allocated by `pods_on_node`
pub fn node(node: &corev1::Node, pods_on_node: &[corev1::Pod]) -> Node {
    let status = node.status.as_ref();
    let name = node.name_any();

    let mut requests = ResourceList::new();
    let mut limits = ResourceList::new();
    for pod in pods_on_node {
        if let Some(spec) = pod.spec.as_ref() {
            let (pod_requests, pod_limits) = pod_requests_and_limits(spec);
            quantity::add_into(&mut requests, &pod_requests);
            quantity::add_into(&mut limits, &pod_limits);
        }
    }

    let node_ip = status
        .and_then(|s| s.addresses.as_ref())
        .and_then(|addresses| addresses.iter().find(|a| a.type_ == "InternalIP"))
        .map(|a| a.address.clone())
        .unwrap_or_default();

    let capacity = raw_map(status.and_then(|s| s.capacity.as_ref()));
    let allocatable = raw_map(status.and_then(|s| s.allocatable.as_ref()));
    let requests_allocated = quantity::to_string_map(&requests);
    let limits_allocated = quantity::to_string_map(&limits);

    let warp_drive_storage_list = node
        .annotations()
        .get(VOLUME_POOL_ANNOTATION)
        .filter(|raw| !raw.is_empty())
        .map(|raw| warp_drive_storage(&name, raw))
        .unwrap_or_default();

    Node {
        meta: Meta::new(ResourceKind::Node, "", &name, status::node_state(node)),
        labels: labels_of(node),
        annotations: annotations_of(node),
        node_ip,
        unify_unit_resource_info: UnifyUnitNodeResourceInfo {
            capacity: node_resource_info(&capacity),
            allocatable: node_resource_info(&allocatable),
            requests_allocated: node_resource_info(&requests_allocated),
            limits_allocated: node_resource_info(&limits_allocated),
        },
        capacity,
        allocatable,
        requests_allocated,
        limits_allocated,
        warp_drive_storage_list,
    }
}
