use super::quantity;
use super::time_string;
use crate::models::tenant::{
    MULTI_TENANT_LABEL_KEY, TenantQuota, TenantQuotaInfo, UnifyUnitTenantQuota,
    UnifyUnitTenantQuotaInfo,
};
use crate::models::{ResourceQuota, TenantInfo};
use k8s_openapi::api::core::v1 as corev1;
use kube::ResourceExt;
use std::collections::BTreeMap;

fn quota_info(list: &BTreeMap<String, String>) -> TenantQuotaInfo {
    let get = |key: &str| list.get(key).cloned().unwrap_or_default();
    TenantQuotaInfo {
        limit_cpu: get("limits.cpu"),
        limit_memory: get("limits.memory"),
        requests_cpu: get("requests.cpu"),
        requests_memory: get("requests.memory"),
        requests_storage: get("requests.storage"),
        pods: get("pods"),
    }
}

fn unify_unit(info: &TenantQuotaInfo) -> UnifyUnitTenantQuotaInfo {
    UnifyUnitTenantQuotaInfo {
        limit_cpu: quantity::cpu_cores(&info.limit_cpu),
        limit_memory: quantity::memory_mi(&info.limit_memory),
        requests_cpu: quantity::cpu_cores(&info.requests_cpu),
        requests_memory: quantity::memory_mi(&info.requests_memory),
        requests_storage: quantity::storage_gi(&info.requests_storage),
        pods: quantity::count(&info.pods),
    }
}

/// Tenant summary of a namespace and the quotas defined in it
pub fn tenant_info(namespace: &corev1::Namespace, quotas: &[ResourceQuota]) -> TenantInfo {
    let labels = namespace.labels().clone();
    let phase = namespace
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_default();

    let mut tenant_quotas = Vec::with_capacity(quotas.len());
    let mut unify_unit_tenant_quotas = Vec::with_capacity(quotas.len());
    for quota in quotas {
        let hard = quota_info(&quota.resource_limits);
        let used = quota_info(&quota.resource_used);
        unify_unit_tenant_quotas.push(UnifyUnitTenantQuota {
            quota_name: quota.meta.name.clone(),
            hard: unify_unit(&hard),
            used: unify_unit(&used),
        });
        tenant_quotas.push(TenantQuota {
            quota_name: quota.meta.name.clone(),
            hard,
            used,
        });
    }

    TenantInfo {
        tenant_name: namespace.name_any(),
        tenant_creation_time: time_string(namespace.metadata.creation_timestamp.as_ref()),
        multi_tenant: labels.contains_key(MULTI_TENANT_LABEL_KEY),
        tenant_labels: labels,
        tenant_annotations: namespace.annotations().clone(),
        ready: phase == "Active",
        tenant_status: phase,
        tenant_quotas,
        unify_unit_tenant_quotas,
    }
}
