//! Watch-fed reflectors for every cached kind
//!
//! Each kind gets a reflector task that keeps a [`Store`] current. The
//! ReleaseConfig reflector also forwards its events to the registered
//! [`ReleaseConfigHandler`](super::ReleaseConfigHandler)s.

use super::handler::{HandlerRegistry, ReleaseConfigDispatcher};
use super::lister::{Lister, Listers};
use crate::error::CacheError;
use crate::models::crd;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::storage::v1 as storagev1;
use kube::core::NamespaceResourceScope;
use kube::runtime::reflector::{self, Store};
use kube::runtime::{WatchStreamExt, watcher};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Where and how the informers watch
#[derive(Debug, Clone, Default)]
pub struct InformerOptions {
    /// Restrict namespaced kinds to one namespace
    pub namespace: Option<String>,
    /// Re-deliver known ReleaseConfigs as updates at this interval
    pub resync: Option<Duration>,
}

type ReadyFuture = BoxFuture<'static, bool>;

/// Running reflectors and the listers reading from them
pub struct Informers {
    listers: Listers,
    pending: Vec<(String, ReadyFuture)>,
    handles: Vec<JoinHandle<()>>,
}

impl Informers {
    /// Spawn one reflector per kind
    pub fn start(client: Client, options: InformerOptions, handlers: HandlerRegistry) -> Self {
        let mut informers = Self {
            listers: Listers::default(),
            pending: Vec::new(),
            handles: Vec::new(),
        };
        let ns = options.namespace.as_deref();

        informers.listers.pods = informers.reflect(namespaced_api(&client, ns));
        informers.listers.deployments = informers.reflect(namespaced_api(&client, ns));
        informers.listers.stateful_sets = informers.reflect(namespaced_api(&client, ns));
        informers.listers.daemon_sets = informers.reflect(namespaced_api(&client, ns));
        informers.listers.jobs = informers.reflect(namespaced_api(&client, ns));
        informers.listers.services = informers.reflect(namespaced_api(&client, ns));
        informers.listers.endpoints = informers.reflect(namespaced_api(&client, ns));
        informers.listers.ingresses = informers.reflect(namespaced_api(&client, ns));
        informers.listers.config_maps = informers.reflect(namespaced_api(&client, ns));
        informers.listers.secrets = informers.reflect(namespaced_api(&client, ns));
        informers.listers.resource_quotas = informers.reflect(namespaced_api(&client, ns));
        informers.listers.persistent_volume_claims =
            informers.reflect(namespaced_api(&client, ns));
        informers.listers.application_instances = informers.reflect(namespaced_api(&client, ns));

        informers.listers.nodes = informers.reflect(Api::<corev1::Node>::all(client.clone()));
        informers.listers.namespaces =
            informers.reflect(Api::<corev1::Namespace>::all(client.clone()));
        informers.listers.storage_classes =
            informers.reflect(Api::<storagev1::StorageClass>::all(client.clone()));

        let mut dispatcher = ReleaseConfigDispatcher::new(handlers);
        let (store, handle) = spawn_reflector(
            namespaced_api::<crd::ReleaseConfig>(&client, ns),
            options.resync,
            move |event| match event {
                Some(event) => dispatcher.handle(event),
                None => dispatcher.resync(),
            },
        );
        informers.track(store.clone(), handle);
        informers.listers.release_configs = Arc::new(store);

        info!(
            namespace = ns.unwrap_or("<all>"),
            count = informers.handles.len(),
            "Started informers"
        );
        informers
    }

    pub fn listers(&self) -> Listers {
        self.listers.clone()
    }

    /// Wait until every reflector finished its initial list
    pub async fn wait_for_cache_sync(&mut self, timeout: Duration) -> Result<(), CacheError> {
        let deadline = Instant::now() + timeout;
        for (kind, ready) in self.pending.drain(..) {
            match tokio::time::timeout_at(deadline, ready).await {
                Ok(true) => debug!(kind = %kind, "Cache synced"),
                Ok(false) | Err(_) => {
                    error!(kind = %kind, "Cache failed to sync");
                    return Err(CacheError::SyncTimeout(kind));
                }
            }
        }
        info!("All caches synced");
        Ok(())
    }

    /// Abort all reflector tasks
    pub fn stop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        self.handles.clear();
    }

    fn reflect<K>(&mut self, api: Api<K>) -> Arc<dyn Lister<K>>
    where
        K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
        K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
    {
        let (store, handle) = spawn_reflector(api, None, |_| {});
        self.track(store.clone(), handle);
        Arc::new(store)
    }

    fn track<K>(&mut self, store: Store<K>, handle: JoinHandle<()>)
    where
        K: Resource + Clone + Send + Sync + 'static,
        K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
    {
        let kind = K::kind(&K::DynamicType::default()).to_string();
        let ready = async move { store.wait_until_ready().await.is_ok() }.boxed();
        self.pending.push((kind, ready));
        self.handles.push(handle);
    }
}

impl Drop for Informers {
    fn drop(&mut self) {
        self.stop();
    }
}

fn namespaced_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Run a reflector for `api`, passing each event to `on_event`
///
/// `on_event` receives `None` on every resync tick.
fn spawn_reflector<K, F>(
    api: Api<K>,
    resync: Option<Duration>,
    mut on_event: F,
) -> (Store<K>, JoinHandle<()>)
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
    F: FnMut(Option<&watcher::Event<K>>) + Send + 'static,
{
    let kind = K::kind(&K::DynamicType::default()).to_string();
    let (reader, writer) = reflector::store();
    let stream = reflector::reflector(
        writer,
        watcher(api, watcher::Config::default()).default_backoff(),
    );

    let handle = tokio::spawn(async move {
        let mut stream = Box::pin(stream);
        let mut ticker = resync.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut error_count = 0u32;

        loop {
            let next = match ticker.as_mut() {
                Some(interval) => tokio::select! {
                    next = stream.next() => next,
                    _ = interval.tick() => {
                        on_event(None);
                        continue;
                    }
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(event)) => {
                    error_count = 0;
                    on_event(Some(&event));
                }
                Some(Err(e)) => {
                    error_count += 1;
                    // Log the first failure and then every tenth to avoid spam
                    if error_count == 1 || error_count.is_multiple_of(10) {
                        warn!(kind = %kind, errors = error_count, "Watch error: {}", e);
                    }
                }
                None => {
                    warn!(kind = %kind, "Watch stream terminated");
                    break;
                }
            }
        }
    });

    (reader, handle)
}
