//! Watch-backed resource cache
//!
//! Structure:
//! - `informer.rs` - Reflector tasks that keep one store per kind current
//! - `lister.rs` - Read access to those stores
//! - `handler.rs` - ReleaseConfig change notifications
//! - `client.rs` - Uncached API calls (events, logs, pods per node)
//! - `resource_cache.rs` - Kind-polymorphic lookups built from all of the above

pub mod client;
pub mod handler;
pub mod informer;
pub mod lister;
pub mod resource_cache;

pub use client::{ClusterApi, KubeClusterApi};
pub use handler::{HandlerRegistry, ReleaseConfigHandler};
pub use informer::{InformerOptions, Informers};
pub use lister::{Lister, Listers};
pub use resource_cache::{Lookup, ResourceCache};

use crate::config::Config;
use crate::error::CacheError;
use kube::Client;
use std::sync::Arc;
use tracing::info;

/// Start the informers and wait for the initial sync
///
/// The returned [`Informers`] owns the reflector tasks; dropping it stops them.
pub async fn start_cache(
    client: Client,
    config: &Config,
) -> Result<(ResourceCache, Informers), CacheError> {
    let handlers = HandlerRegistry::new();
    let options = InformerOptions {
        namespace: config.informer_namespace(),
        resync: config.resync_period(),
    };
    let mut informers = Informers::start(client.clone(), options, handlers.clone());
    informers.wait_for_cache_sync(config.sync_timeout()).await?;

    let cache = ResourceCache::new(
        informers.listers(),
        Arc::new(KubeClusterApi::new(client)),
        handlers,
    )
    .with_node_concurrency(config.nodes.concurrency);
    info!("Resource cache is ready");
    Ok((cache, informers))
}
