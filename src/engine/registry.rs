// Process-wide dedup map — cache key to the in-flight or most recent task.
// Owned explicitly (created per engine, injected into the factory) so tests
// can reset it between cases.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::engine::task::FileTask;

struct IdleState {
    pending: AtomicUsize,
    tx: watch::Sender<bool>,
}

impl IdleState {
    fn task_started(&self) {
        if self.pending.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = self.tx.send(false);
        }
    }

    fn task_done(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.tx.send(true);
        }
    }
}

/// The authority deciding whether a request starts a new fetch or attaches
/// to an existing one. All mutations are atomic with respect to concurrent
/// lookups: one mutex guards the whole map.
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, Arc<FileTask>>>,
    idle: Arc<IdleState>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self {
            tasks: Mutex::new(HashMap::new()),
            idle: Arc::new(IdleState {
                pending: AtomicUsize::new(0),
                tx,
            }),
        }
    }

    /// Return the task registered under `key`, pending or terminal.
    pub fn get(&self, key: &str) -> Option<Arc<FileTask>> {
        self.tasks.lock().get(key).cloned()
    }

    /// Return the existing task for `key`, or register the one produced by
    /// `create`. The check and insert happen under one lock, so concurrent
    /// callers for the same key always share a single task.
    ///
    /// With `force` the current entry is evicted first; this is the retry
    /// path, which replaces a stale terminal failure with a fresh fetch.
    pub fn get_or_insert_with(
        &self,
        key: &str,
        force: bool,
        create: impl FnOnce() -> Arc<FileTask>,
    ) -> Arc<FileTask> {
        let task = {
            let mut tasks = self.tasks.lock();
            if force {
                if tasks.remove(key).is_some() {
                    debug!("evicted stale task for key {}", key);
                }
            } else if let Some(existing) = tasks.get(key) {
                return Arc::clone(existing);
            }
            let task = create();
            tasks.insert(key.to_string(), Arc::clone(&task));
            task
        };
        self.track(&task);
        task
    }

    /// Remove the entry for `key`, leaving any in-flight fetch running for
    /// the holders that already attached.
    pub fn remove(&self, key: &str) -> Option<Arc<FileTask>> {
        self.tasks.lock().remove(key)
    }

    /// Drop every entry. In-flight fetches keep running for their holders.
    pub fn clear(&self) {
        self.tasks.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Whether no registered task is still pending.
    pub fn is_idle(&self) -> bool {
        self.idle.pending.load(Ordering::SeqCst) == 0
    }

    /// Observe idle transitions, e.g. to wait for quiescence in tests.
    pub fn subscribe_idle(&self) -> watch::Receiver<bool> {
        self.idle.tx.subscribe()
    }

    /// Count a pending task toward the idle state and arrange for it to be
    /// counted back out on completion, whichever way it completes.
    fn track(&self, task: &Arc<FileTask>) {
        if task.is_complete() {
            return;
        }
        self.idle.task_started();
        let on_success = Arc::clone(&self.idle);
        let on_failure = Arc::clone(&self.idle);
        task.on_success(move |_| on_success.task_done())
            .on_failure(move |_| on_failure.task_done());
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
