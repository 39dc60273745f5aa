//! Mutating operations on cluster workloads
//!
//! Only scaling is needed here; it backs [`ResourceSet::pause`](crate::models::ResourceSet::pause).

use crate::models::ResourceKind;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("{0} cannot be scaled")]
    Unsupported(ResourceKind),

    #[error("failed to scale {kind} {namespace}/{name}: {source}")]
    Kube {
        kind: ResourceKind,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("scale of {kind} {namespace}/{name} rejected: {message}")]
    Rejected {
        kind: ResourceKind,
        namespace: String,
        name: String,
        message: String,
    },
}

/// Changes the replica count of a scalable workload
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scaler: Send + Sync {
    async fn scale(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<(), ScaleError>;
}

/// Scaler backed by the scale subresource of the API server
#[derive(Clone)]
pub struct KubeScaler {
    client: Client,
}

impl KubeScaler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scaler for KubeScaler {
    async fn scale(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<(), ScaleError> {
        let patch = Patch::Merge(serde_json::json!({ "spec": { "replicas": replicas } }));
        let params = PatchParams::default();
        let result = match kind {
            ResourceKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                api.patch_scale(name, &params, &patch).await
            }
            ResourceKind::StatefulSet => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
                api.patch_scale(name, &params, &patch).await
            }
            other => return Err(ScaleError::Unsupported(other)),
        };

        result.map_err(|source| ScaleError::Kube {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        })?;
        info!("scaled {} {}/{} to {} replicas", kind, namespace, name, replicas);
        Ok(())
    }
}
