//! Tenant summaries
//!
//! A tenant is a namespace together with the resource quotas defined in it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label whose presence marks a namespace as shared by several tenants
pub const MULTI_TENANT_LABEL_KEY: &str = "multi-tenant";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TenantInfoList {
    pub items: Vec<TenantInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    pub tenant_name: String,
    pub tenant_creation_time: String,
    pub tenant_labels: BTreeMap<String, String>,
    pub tenant_annotations: BTreeMap<String, String>,
    pub tenant_status: String,
    pub tenant_quotas: Vec<TenantQuota>,
    pub multi_tenant: bool,
    pub ready: bool,
    pub unify_unit_tenant_quotas: Vec<UnifyUnitTenantQuota>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuota {
    pub quota_name: String,
    pub hard: TenantQuotaInfo,
    pub used: TenantQuotaInfo,
}

/// Raw quantity strings as they appear in the quota
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantQuotaInfo {
    pub limit_cpu: String,
    pub limit_memory: String,
    pub requests_cpu: String,
    pub requests_memory: String,
    pub requests_storage: String,
    pub pods: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyUnitTenantQuota {
    pub quota_name: String,
    pub hard: UnifyUnitTenantQuotaInfo,
    pub used: UnifyUnitTenantQuotaInfo,
}

/// CPU in cores, memory in Mi, storage in Gi
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyUnitTenantQuotaInfo {
    pub limit_cpu: f64,
    pub limit_memory: i64,
    pub requests_cpu: f64,
    pub requests_memory: i64,
    pub requests_storage: i64,
    pub pods: i64,
}
