//! ReleaseConfig change notifications
//!
//! The informer feeds every watch event through a [`ReleaseConfigDispatcher`],
//! which remembers the last object seen per key so updates carry the
//! previous version and a relist after a watch restart turns into the
//! minimal set of add, update and delete callbacks.

use crate::models::crd::ReleaseConfig;
use kube::ResourceExt;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Subscriber for ReleaseConfig changes
pub trait ReleaseConfigHandler: Send + Sync {
    fn on_add(&self, config: &ReleaseConfig);
    fn on_update(&self, old: &ReleaseConfig, new: &ReleaseConfig);
    fn on_delete(&self, config: &ReleaseConfig);
}

/// Thread-safe list of registered handlers
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<RwLock<Vec<Arc<dyn ReleaseConfigHandler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handler: Arc<dyn ReleaseConfigHandler>) {
        let mut handlers = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        handlers.push(handler);
    }

    /// Unregister `handler`; returns whether it was registered
    pub fn remove(&self, handler: &Arc<dyn ReleaseConfigHandler>) -> bool {
        let mut handlers = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handlers registered so far; callbacks run without holding the lock
    fn snapshot(&self) -> Vec<Arc<dyn ReleaseConfigHandler>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn notify_add(&self, config: &ReleaseConfig) {
        for handler in self.snapshot() {
            handler.on_add(config);
        }
    }

    fn notify_update(&self, old: &ReleaseConfig, new: &ReleaseConfig) {
        for handler in self.snapshot() {
            handler.on_update(old, new);
        }
    }

    fn notify_delete(&self, config: &ReleaseConfig) {
        for handler in self.snapshot() {
            handler.on_delete(config);
        }
    }
}

type Known = HashMap<ObjectRef<ReleaseConfig>, Arc<ReleaseConfig>>;

/// Turns raw watch events into handler callbacks
pub struct ReleaseConfigDispatcher {
    registry: HandlerRegistry,
    known: Known,
    relist: Option<Known>,
}

impl ReleaseConfigDispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            known: HashMap::new(),
            relist: None,
        }
    }

    pub fn handle(&mut self, event: &watcher::Event<ReleaseConfig>) {
        match event {
            watcher::Event::Apply(config) => self.apply(config.clone()),
            watcher::Event::Delete(config) => {
                self.known.remove(&ObjectRef::from_obj(config));
                debug!(namespace = ?config.namespace(), name = %config.name_any(), "ReleaseConfig deleted");
                self.registry.notify_delete(config);
            }
            watcher::Event::Init => {
                self.relist = Some(HashMap::new());
            }
            watcher::Event::InitApply(config) => {
                self.relist
                    .get_or_insert_with(HashMap::new)
                    .insert(ObjectRef::from_obj(config), Arc::new(config.clone()));
            }
            watcher::Event::InitDone => self.finish_relist(),
        }
    }

    /// Re-deliver every known config as an update of itself
    pub fn resync(&self) {
        for config in self.known.values() {
            self.registry.notify_update(config, config);
        }
    }

    fn apply(&mut self, config: ReleaseConfig) {
        let key = ObjectRef::from_obj(&config);
        let config = Arc::new(config);
        match self.known.insert(key, config.clone()) {
            Some(old) => self.registry.notify_update(&old, &config),
            None => self.registry.notify_add(&config),
        }
    }

    fn finish_relist(&mut self) {
        let fresh = self.relist.take().unwrap_or_default();

        for (key, old) in &self.known {
            if !fresh.contains_key(key) {
                self.registry.notify_delete(old);
            }
        }
        for (key, config) in &fresh {
            match self.known.get(key) {
                Some(old) if old.resource_version() == config.resource_version() => {}
                Some(old) => self.registry.notify_update(old, config),
                None => self.registry.notify_add(config),
            }
        }

        debug!(count = fresh.len(), "ReleaseConfig relist complete");
        self.known = fresh;
    }
}
