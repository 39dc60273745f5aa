//! Deduplicating, delaying work queue
//!
//! Keys are strings (`namespace/name`). A key is held at most once while
//! waiting, and a key re-added while a worker processes it is queued again
//! only after that worker calls [`WorkQueue::done`], so one key is never
//! processed by two workers at the same time.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct QueueState {
    queue: VecDeque<String>,
    /// Keys waiting to be processed, queued or not
    dirty: HashSet<String>,
    processing: HashSet<String>,
    shutting_down: bool,
}

pub struct WorkQueue {
    name: String,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue `key` unless it is already waiting
    pub fn add(&self, key: impl Into<String>) {
        let key = key.into();
        let mut state = self.lock();
        if state.shutting_down || !state.dirty.insert(key.clone()) {
            return;
        }
        if state.processing.contains(&key) {
            // requeued by done()
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.notify.notify_one();
    }

    /// Enqueue `key` once `delay` has elapsed
    pub fn add_after(self: &Arc<Self>, key: impl Into<String>, delay: Duration) {
        let key = key.into();
        if delay.is_zero() {
            self.add(key);
            return;
        }
        if self.is_shutting_down() {
            return;
        }
        debug!(queue = %self.name, key = %key, "Requeue after {:?}", delay);
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Wait for the next key
    ///
    /// Returns `None` once the queue is shut down; keys still waiting are
    /// not handed out.
    pub async fn get(&self) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
            }

            notified.await;
        }
    }

    /// Mark `key` as processed, queueing it again if it was re-added meanwhile
    pub fn done(&self, key: &str) {
        let mut state = self.lock();
        state.processing.remove(key);
        if state.dirty.contains(key) {
            state.queue.push_back(key.to_string());
            drop(state);
            self.notify.notify_one();
        }
    }

    /// Stop accepting keys and wake every waiting worker
    pub fn shut_down(&self) {
        self.lock().shutting_down = true;
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    /// Number of keys waiting
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_deduplicates_waiting_keys() {
        let queue = WorkQueue::new("test");
        queue.add("ns/a");
        queue.add("ns/a");
        queue.add("ns/b");
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().await.as_deref(), Some("ns/a"));
        assert_eq!(queue.get().await.as_deref(), Some("ns/b"));
    }

    #[tokio::test]
    async fn test_key_readded_while_processing_waits_for_done() {
        let queue = WorkQueue::new("test");
        queue.add("ns/a");
        let key = queue.get().await.unwrap();

        queue.add("ns/a");
        assert!(queue.is_empty());

        queue.done(&key);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await.as_deref(), Some("ns/a"));
    }

    #[tokio::test]
    async fn test_shut_down_wakes_waiting_workers() {
        let queue = WorkQueue::new("test");
        let worker = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::task::yield_now().await;

        queue.shut_down();
        assert_eq!(worker.await.unwrap(), None);

        queue.add("ns/late");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_shut_down_stops_dequeuing() {
        let queue = WorkQueue::new("test");
        queue.add("ns/a");
        queue.shut_down();
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn test_add_after_delays_key() {
        let queue = WorkQueue::new("test");
        queue.add_after("ns/a", Duration::from_millis(30));
        assert!(queue.is_empty());

        let key = tokio::time::timeout(Duration::from_secs(2), queue.get())
            .await
            .unwrap();
        assert_eq!(key.as_deref(), Some("ns/a"));
    }
}
