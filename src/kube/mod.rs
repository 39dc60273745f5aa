//! Kubernetes client module
//!
//! Handles connection to the Kubernetes API server and provides a
//! configured client for the informers and uncached reads.
//!
//! Proxies set in the kubeconfig (`proxy-url`, HTTP or SOCKS5) are honoured.

use anyhow::{Context, Result};
use kube::{Client, Config};
use tracing::debug;

/// Initialize and return a Kubernetes client
///
/// Uses the default kubeconfig loading strategy:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
pub async fn create_client() -> Result<Client> {
    let config = Config::infer()
        .await
        .context("Failed to infer Kubernetes configuration")?;

    debug!(
        cluster = %config.cluster_url,
        namespace = %config.default_namespace,
        proxy = config.proxy_url.is_some(),
        "Connecting to cluster"
    );

    let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
    Ok(client)
}
