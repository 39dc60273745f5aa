//! Custom resource definitions
//!
//! `ReleaseConfig` records the inputs and published outputs of one
//! installed release. `ApplicationInstance` tracks the modules an
//! application template created.

use k8s_openapi::api::core::v1::ObjectReference;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const GROUP: &str = "transwarp.k8s.io";
pub const VERSION: &str = "v1beta1";

/// Spec of a ReleaseConfig
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "transwarp.k8s.io",
    version = "v1beta1",
    kind = "ReleaseConfig",
    plural = "releaseconfigs",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfigSpec {
    #[serde(default)]
    pub config_values: Map<String, Value>,
    #[serde(default)]
    pub dependencies_config_values: Map<String, Value>,
    /// Local alias mapped to `name` or `namespace.name` of the dependency
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub chart_name: String,
    #[serde(default)]
    pub chart_version: String,
    #[serde(default)]
    pub chart_app_version: String,
    #[serde(default)]
    pub output_config: Map<String, Value>,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub chart_image: String,
}

/// Spec of an ApplicationInstance
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "transwarp.k8s.io",
    version = "v1beta1",
    kind = "ApplicationInstance",
    plural = "applicationinstances",
    namespaced,
    status = "ApplicationInstanceStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInstanceSpec {
    pub application_ref: ApplicationReference,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub configs: Map<String, Value>,
    #[serde(default)]
    pub dependencies: Vec<InstanceDependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationReference {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDependency {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dependency_ref: ObjectReference,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInstanceStatus {
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub modules: Vec<ModuleReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReference {
    #[serde(default)]
    pub resource_ref: ObjectReference,
}
