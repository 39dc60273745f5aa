//! Resource kind definitions
//!
//! Closed enumeration of every Kubernetes kind the cache understands.
//! Dispatch in the cache and in resource sets matches on this enum so a
//! new kind fails to compile until every site handles it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumeration of all supported resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    // Workloads
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    Pod,
    // Networking
    Service,
    Ingress,
    // Configuration
    ConfigMap,
    Secret,
    // Cluster and storage
    Node,
    Namespace,
    ResourceQuota,
    PersistentVolumeClaim,
    StorageClass,
    // Custom resources
    ReleaseConfig,
    ApplicationInstance,
}

impl ResourceKind {
    /// Get the Kubernetes kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::Job => "Job",
            ResourceKind::Pod => "Pod",
            ResourceKind::Service => "Service",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
            ResourceKind::Node => "Node",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::ResourceQuota => "ResourceQuota",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::StorageClass => "StorageClass",
            ResourceKind::ReleaseConfig => "ReleaseConfig",
            ResourceKind::ApplicationInstance => "ApplicationInstance",
        }
    }

    /// Try to parse a string into a ResourceKind, returning None if invalid
    pub fn parse_optional(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Get all resource kinds
    pub fn all() -> &'static [Self] {
        &[
            ResourceKind::Deployment,
            ResourceKind::StatefulSet,
            ResourceKind::DaemonSet,
            ResourceKind::Job,
            ResourceKind::Pod,
            ResourceKind::Service,
            ResourceKind::Ingress,
            ResourceKind::ConfigMap,
            ResourceKind::Secret,
            ResourceKind::Node,
            ResourceKind::Namespace,
            ResourceKind::ResourceQuota,
            ResourceKind::PersistentVolumeClaim,
            ResourceKind::StorageClass,
            ResourceKind::ReleaseConfig,
            ResourceKind::ApplicationInstance,
        ]
    }

    /// Whether the kind lives outside any namespace
    pub fn is_cluster_scoped(&self) -> bool {
        matches!(
            self,
            ResourceKind::Node | ResourceKind::Namespace | ResourceKind::StorageClass
        )
    }

    /// Whether readiness of this kind is derived from the pods it owns
    pub fn owns_pods(&self) -> bool {
        matches!(
            self,
            ResourceKind::Deployment
                | ResourceKind::StatefulSet
                | ResourceKind::DaemonSet
                | ResourceKind::Job
        )
    }

    /// Whether this kind can be a member of a [`ResourceSet`](super::ResourceSet)
    pub fn is_set_member(&self) -> bool {
        matches!(
            self,
            ResourceKind::Deployment
                | ResourceKind::StatefulSet
                | ResourceKind::DaemonSet
                | ResourceKind::Job
                | ResourceKind::Service
                | ResourceKind::Ingress
                | ResourceKind::ConfigMap
                | ResourceKind::Secret
        )
    }

    /// Try to parse a string (case-insensitive, with common short names)
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deployment" | "deployments" | "deploy" => Some(ResourceKind::Deployment),
            "statefulset" | "statefulsets" | "sts" => Some(ResourceKind::StatefulSet),
            "daemonset" | "daemonsets" | "ds" => Some(ResourceKind::DaemonSet),
            "job" | "jobs" => Some(ResourceKind::Job),
            "pod" | "pods" | "po" => Some(ResourceKind::Pod),
            "service" | "services" | "svc" => Some(ResourceKind::Service),
            "ingress" | "ingresses" | "ing" => Some(ResourceKind::Ingress),
            "configmap" | "configmaps" | "cm" => Some(ResourceKind::ConfigMap),
            "secret" | "secrets" => Some(ResourceKind::Secret),
            "node" | "nodes" | "no" => Some(ResourceKind::Node),
            "namespace" | "namespaces" | "ns" => Some(ResourceKind::Namespace),
            "resourcequota" | "resourcequotas" | "quota" => Some(ResourceKind::ResourceQuota),
            "persistentvolumeclaim" | "persistentvolumeclaims" | "pvc" => {
                Some(ResourceKind::PersistentVolumeClaim)
            }
            "storageclass" | "storageclasses" | "sc" => Some(ResourceKind::StorageClass),
            "releaseconfig" | "releaseconfigs" | "rc" => Some(ResourceKind::ReleaseConfig),
            "applicationinstance" | "applicationinstances" | "instance" => {
                Some(ResourceKind::ApplicationInstance)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::all()
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown resource kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_round_trips_through_from_str() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::parse_optional(kind.as_str()), Some(*kind));
        }
        assert_eq!(ResourceKind::parse_optional("CronJob"), None);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(
            ResourceKind::from_str_case_insensitive("sts"),
            Some(ResourceKind::StatefulSet)
        );
        assert_eq!(
            ResourceKind::from_str_case_insensitive("PVC"),
            Some(ResourceKind::PersistentVolumeClaim)
        );
        assert_eq!(ResourceKind::from_str_case_insensitive("widget"), None);
    }

    #[test]
    fn test_scopes() {
        assert!(ResourceKind::Node.is_cluster_scoped());
        assert!(!ResourceKind::Secret.is_cluster_scoped());
        assert!(ResourceKind::Job.owns_pods());
        assert!(!ResourceKind::Service.owns_pods());
        assert!(ResourceKind::Secret.is_set_member());
        assert!(!ResourceKind::ApplicationInstance.is_set_member());
        assert!(!ResourceKind::Pod.is_set_member());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ResourceKind::ReleaseConfig), "ReleaseConfig");
    }
}
