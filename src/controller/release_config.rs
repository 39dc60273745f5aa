//! Reloads releases whose dependencies published a new output config
//!
//! Changed ReleaseConfigs are keyed onto the `release-config` queue. Its
//! workers find every config that depends on the changed one and key the
//! dependents onto `reload-depending-release`, whose workers ask the
//! installer to reload them. The two levels let the queue fold several
//! dependency changes into one reload per dependent.
//!
//! With a publisher configured, a third queue `release-config-event`
//! reports spec changes and deletions as delta events.

use super::dependency::{find_dependents, output_config_changed};
use super::installer::ReleaseInstaller;
use super::publisher::{DeltaEventType, ReleaseConfigDeltaEvent, ReleaseConfigPublisher};
use super::queue::WorkQueue;
use crate::cache::{ReleaseConfigHandler, ResourceCache};
use crate::config::ControllerConfig;
use crate::models::{Resource, ResourceKind, crd};
use kube::ResourceExt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const RELEASE_CONFIG_QUEUE: &str = "release-config";
pub const RELOAD_QUEUE: &str = "reload-depending-release";
pub const EVENT_QUEUE: &str = "release-config-event";

#[derive(Clone)]
struct Queues {
    changed: Arc<WorkQueue>,
    reload: Arc<WorkQueue>,
    events: Option<Arc<WorkQueue>>,
}

impl Queues {
    fn shut_down(&self) {
        self.changed.shut_down();
        self.reload.shut_down();
        if let Some(events) = &self.events {
            events.shut_down();
        }
    }
}

/// Everything a worker needs, cheap to clone into tasks
#[derive(Clone)]
struct Reconciler {
    cache: ResourceCache,
    installer: Arc<dyn ReleaseInstaller>,
    publisher: Option<Arc<dyn ReleaseConfigPublisher>>,
    queues: Queues,
    retry_delay: Duration,
}

pub struct ReleaseConfigController {
    reconciler: Reconciler,
    config: ControllerConfig,
    started: AtomicBool,
    accepting: Arc<AtomicBool>,
}

impl ReleaseConfigController {
    pub fn new(
        cache: ResourceCache,
        installer: Arc<dyn ReleaseInstaller>,
        config: ControllerConfig,
    ) -> Self {
        let retry_delay = match config.retry_reload_delay() {
            delay if delay.is_zero() => Duration::from_secs(5),
            delay => delay,
        };
        Self {
            reconciler: Reconciler {
                cache,
                installer,
                publisher: None,
                queues: Queues {
                    changed: WorkQueue::new(RELEASE_CONFIG_QUEUE),
                    reload: WorkQueue::new(RELOAD_QUEUE),
                    events: None,
                },
                retry_delay,
            },
            config,
            started: AtomicBool::new(false),
            accepting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publish config delta events through `publisher`
    pub fn with_publisher(mut self, publisher: Arc<dyn ReleaseConfigPublisher>) -> Self {
        self.reconciler.publisher = Some(publisher);
        self.reconciler.queues.events = Some(WorkQueue::new(EVENT_QUEUE));
        self
    }

    /// Run until `stop` turns true or its sender is dropped
    ///
    /// Events are only queued while running. A second call returns at once.
    pub async fn start(&self, mut stop: watch::Receiver<bool>) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Release config controller is already started");
            return;
        }
        info!("Release config controller started");

        let mut workers = JoinSet::new();
        let queues = &self.reconciler.queues;
        spawn_workers(&mut workers, self.config.workers, &queues.changed, {
            let reconciler = self.reconciler.clone();
            move |key| {
                let reconciler = reconciler.clone();
                async move { reconciler.sync_release_config(&key).await }
            }
        });
        spawn_workers(&mut workers, self.config.reload_workers, &queues.reload, {
            let reconciler = self.reconciler.clone();
            move |key| {
                let reconciler = reconciler.clone();
                async move { reconciler.reload_depending_release(&key).await }
            }
        });
        if let Some(events) = &queues.events {
            spawn_workers(&mut workers, self.config.publish_workers, events, {
                let reconciler = self.reconciler.clone();
                move |key| {
                    let reconciler = reconciler.clone();
                    async move { reconciler.publish_release_config(&key).await }
                }
            });
        }

        self.accepting.store(true, Ordering::SeqCst);
        let handler: Arc<dyn ReleaseConfigHandler> = Arc::new(QueueingHandler {
            queues: queues.clone(),
            accepting: self.accepting.clone(),
        });
        self.reconciler
            .cache
            .add_release_config_handler(handler.clone());

        // A dropped sender counts as a stop signal
        let _ = stop.wait_for(|stopped| *stopped).await;

        self.accepting.store(false, Ordering::SeqCst);
        self.reconciler.cache.remove_release_config_handler(&handler);
        queues.shut_down();
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!("Release config worker failed: {}", e);
            }
        }
        info!("Release config controller stopped");
    }
}

fn spawn_workers<F, Fut>(
    workers: &mut JoinSet<()>,
    count: usize,
    queue: &Arc<WorkQueue>,
    process: F,
) where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    for _ in 0..count.max(1) {
        let queue = queue.clone();
        let process = process.clone();
        workers.spawn(async move {
            while let Some(key) = queue.get().await {
                process(key.clone()).await;
                queue.done(&key);
            }
            debug!(queue = %queue.name(), "Worker exiting");
        });
    }
}

impl Reconciler {
    /// Queue every config that depends on `key` for a reload
    async fn sync_release_config(&self, key: &str) {
        let Some((namespace, name)) = split_key(key) else {
            return;
        };

        let configs = match self.cache.list_release_configs(None, "") {
            Ok(configs) => configs,
            Err(e) => {
                error!("Failed to list all release configs: {}", e);
                return;
            }
        };

        for dependent in find_dependents(&configs, namespace, name) {
            let dependent_key = object_key(&dependent.meta.namespace, &dependent.meta.name);
            debug!(dependency = %key, dependent = %dependent_key, "Queueing dependent release");
            self.queues.reload.add(dependent_key);
        }
    }

    async fn reload_depending_release(&self, key: &str) {
        let Some((namespace, name)) = split_key(key) else {
            return;
        };

        info!("Start to reload release {}", key);
        match self.installer.reload_release(namespace, name, false).await {
            Ok(()) => debug!("Reloaded release {}", key),
            Err(e) if e.is_release_busy() => {
                warn!(
                    "Depending release {} would be reloaded after {:?}",
                    key, self.retry_delay
                );
                self.queues.reload.add_after(key, self.retry_delay);
            }
            Err(e) => error!("Failed to reload depending release {}: {}", key, e),
        }
    }

    async fn publish_release_config(&self, key: &str) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let Some((namespace, name)) = split_key(key) else {
            return;
        };

        let event = match self
            .cache
            .get_resource(ResourceKind::ReleaseConfig, namespace, name)
        {
            Ok(Resource::ReleaseConfig(data)) => ReleaseConfigDeltaEvent {
                event_type: DeltaEventType::CreateOrUpdate,
                data,
            },
            Ok(other) => {
                error!("Unexpected {} returned for release config {}", other.kind_name(), key);
                return;
            }
            Err(e) if e.is_not_found() => {
                let Resource::ReleaseConfig(data) =
                    Resource::not_found(ResourceKind::ReleaseConfig, namespace, name)
                else {
                    return;
                };
                ReleaseConfigDeltaEvent {
                    event_type: DeltaEventType::Delete,
                    data,
                }
            }
            Err(e) => {
                error!("Failed to get release config {}: {}", key, e);
                return;
            }
        };

        match publisher.publish(&event).await {
            Ok(()) => debug!(event = ?event.event_type, "Published release config of {}", key),
            Err(e) => error!("Failed to publish release config of {}: {}", key, e),
        }
    }
}

/// Turns informer callbacks into queue keys
struct QueueingHandler {
    queues: Queues,
    accepting: Arc<AtomicBool>,
}

impl QueueingHandler {
    fn accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    fn enqueue_event(&self, key: &str) {
        if let Some(events) = &self.queues.events {
            events.add(key);
        }
    }
}

impl ReleaseConfigHandler for QueueingHandler {
    fn on_add(&self, config: &crd::ReleaseConfig) {
        if !self.accepting() {
            return;
        }
        let key = crd_key(config);
        self.queues.changed.add(key.clone());
        self.enqueue_event(&key);
    }

    fn on_update(&self, old: &crd::ReleaseConfig, new: &crd::ReleaseConfig) {
        if !self.accepting() {
            return;
        }
        let key = crd_key(new);
        if output_config_changed(&old.spec.output_config, &new.spec.output_config) {
            self.queues.changed.add(key.clone());
        }
        if old.spec != new.spec {
            self.enqueue_event(&key);
        }
    }

    fn on_delete(&self, config: &crd::ReleaseConfig) {
        if !self.accepting() {
            return;
        }
        self.enqueue_event(&crd_key(config));
    }
}

fn object_key(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}

fn crd_key(config: &crd::ReleaseConfig) -> String {
    object_key(&config.namespace().unwrap_or_default(), &config.name_any())
}

/// `namespace/name` or a bare cluster-scoped `name`
fn split_key(key: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = key.split('/').collect();
    match parts.as_slice() {
        [name] => Some(("", *name)),
        [namespace, name] => Some((*namespace, *name)),
        _ => {
            error!("Unexpected key format: {}", key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::client::MockClusterApi;
    use crate::cache::{HandlerRegistry, Listers};
    use crate::controller::installer::MockReleaseInstaller;
    use crate::error::{InstallerError, RELEASE_BUSY_MESSAGE};
    use serde_json::json;

    fn crd(name: &str, output: serde_json::Value) -> crd::ReleaseConfig {
        serde_json::from_value(json!({
            "apiVersion": "transwarp.k8s.io/v1beta1",
            "kind": "ReleaseConfig",
            "metadata": {"name": name, "namespace": "ns"},
            "spec": {"outputConfig": output}
        }))
        .unwrap()
    }

    fn controller(installer: MockReleaseInstaller) -> ReleaseConfigController {
        let cache = ResourceCache::new(
            Listers::default(),
            Arc::new(MockClusterApi::new()),
            HandlerRegistry::new(),
        );
        ReleaseConfigController::new(cache, Arc::new(installer), ControllerConfig::default())
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("ns/app"), Some(("ns", "app")));
        assert_eq!(split_key("node-1"), Some(("", "node-1")));
        assert_eq!(split_key("a/b/c"), None);
    }

    #[test]
    fn test_handler_filters_updates_by_output_config() {
        let controller = controller(MockReleaseInstaller::new());
        let queues = controller.reconciler.queues.clone();
        let handler = QueueingHandler {
            queues: queues.clone(),
            accepting: Arc::new(AtomicBool::new(true)),
        };

        handler.on_update(&crd("a", json!({})), &crd("a", json!({})));
        assert!(queues.changed.is_empty());

        handler.on_update(&crd("a", json!({"port": 1})), &crd("a", json!({"port": 2})));
        assert_eq!(queues.changed.len(), 1);

        handler.on_delete(&crd("b", json!({})));
        assert_eq!(queues.changed.len(), 1);
    }

    #[test]
    fn test_handler_drops_events_before_start() {
        let controller = controller(MockReleaseInstaller::new());
        let queues = controller.reconciler.queues.clone();
        let handler = QueueingHandler {
            queues: queues.clone(),
            accepting: controller.accepting.clone(),
        };

        handler.on_add(&crd("a", json!({})));
        assert!(queues.changed.is_empty());
    }

    #[tokio::test]
    async fn test_busy_release_is_requeued() {
        let mut installer = MockReleaseInstaller::new();
        installer
            .expect_reload_release()
            .withf(|ns, name, force| ns == "ns" && name == "app" && !force)
            .times(1)
            .returning(|_, _, _| Err(InstallerError::Failed(RELEASE_BUSY_MESSAGE.to_string())));
        let mut controller = controller(installer);
        controller.reconciler.retry_delay = Duration::from_millis(10);

        controller.reconciler.reload_depending_release("ns/app").await;

        let reload = controller.reconciler.queues.reload.clone();
        let key = tokio::time::timeout(Duration::from_secs(2), reload.get())
            .await
            .unwrap();
        assert_eq!(key.as_deref(), Some("ns/app"));
    }

    #[tokio::test]
    async fn test_other_failures_are_dropped() {
        let mut installer = MockReleaseInstaller::new();
        installer
            .expect_reload_release()
            .times(1)
            .returning(|_, _, _| Err(InstallerError::Failed("chart not found".to_string())));
        let mut controller = controller(installer);
        controller.reconciler.retry_delay = Duration::from_millis(10);

        controller.reconciler.reload_depending_release("ns/app").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(controller.reconciler.queues.reload.is_empty());
    }
}
