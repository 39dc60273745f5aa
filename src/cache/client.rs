//! Uncached reads that go straight to the API server

use async_trait::async_trait;
use k8s_openapi::api::core::v1 as corev1;
use kube::api::{ListParams, LogParams};
use kube::{Api, Client};

/// Point-in-time queries the watch cache cannot answer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Events whose involved object is the given pod
    async fn search_pod_events(
        &self,
        namespace: &str,
        pod: &str,
        uid: &str,
    ) -> Result<Vec<corev1::Event>, kube::Error>;

    async fn pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<String>,
        tail_lines: Option<i64>,
    ) -> Result<String, kube::Error>;

    /// Pods scheduled on `node` that still hold resources
    async fn pods_on_node(&self, node: &str) -> Result<Vec<corev1::Pod>, kube::Error>;
}

pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn search_pod_events(
        &self,
        namespace: &str,
        pod: &str,
        uid: &str,
    ) -> Result<Vec<corev1::Event>, kube::Error> {
        let api: Api<corev1::Event> = Api::namespaced(self.client.clone(), namespace);
        let mut fields = format!(
            "involvedObject.kind=Pod,involvedObject.namespace={},involvedObject.name={}",
            namespace, pod
        );
        if !uid.is_empty() {
            fields.push_str(&format!(",involvedObject.uid={}", uid));
        }
        let events = api.list(&ListParams::default().fields(&fields)).await?;
        Ok(events.items)
    }

    async fn pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<String>,
        tail_lines: Option<i64>,
    ) -> Result<String, kube::Error> {
        let api: Api<corev1::Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container,
            tail_lines,
            ..LogParams::default()
        };
        api.logs(pod, &params).await
    }

    async fn pods_on_node(&self, node: &str) -> Result<Vec<corev1::Pod>, kube::Error> {
        let api: Api<corev1::Pod> = Api::all(self.client.clone());
        let fields = format!(
            "spec.nodeName={},status.phase!=Succeeded,status.phase!=Failed",
            node
        );
        let pods = api.list(&ListParams::default().fields(&fields)).await?;
        Ok(pods.items)
    }
}
