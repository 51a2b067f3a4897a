// Caller-facing observable over a load. Wraps its own single-completion
// task, so the loading/success/failure view stays consistent no matter how
// many internal retries happen underneath.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::engine::factory::CompositionFactory;
use crate::engine::task::FileTask;
use crate::error::{LoadError, SharedError};
use crate::spec::CompositionSpec;

/// Read-only view over a load in progress: exactly one of `value` or
/// `error` is ever set, and only once. Cheap to clone; all clones observe
/// the same state.
#[derive(Clone)]
pub struct CompositionResult {
    task: Arc<FileTask>,
}

impl CompositionResult {
    fn new() -> Self {
        Self {
            task: Arc::new(FileTask::pending()),
        }
    }

    /// The cached file path. Absent while loading or after a failure.
    pub fn value(&self) -> Option<PathBuf> {
        self.task.value()
    }

    /// The terminal error. Absent while loading or after a success.
    pub fn error(&self) -> Option<SharedError> {
        self.task.error()
    }

    pub fn is_loading(&self) -> bool {
        self.task.is_pending()
    }

    pub fn is_complete(&self) -> bool {
        self.task.is_complete()
    }

    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }

    pub fn is_success(&self) -> bool {
        self.value().is_some()
    }

    /// Suspend until the load completes, yielding the cached file path or
    /// the terminal error. May be awaited by any number of clones.
    pub async fn await_ready(&self) -> Result<PathBuf, SharedError> {
        self.task.join().await
    }

    /// Like [`CompositionResult::await_ready`] but swallows the failure.
    pub async fn await_or_none(&self) -> Option<PathBuf> {
        self.await_ready().await.ok()
    }
}

/// The default retry predicate: never retry.
pub fn no_retry(_failure_count: u32, _error: &LoadError) -> bool {
    false
}

/// Start loading a composition and return its observable result immediately.
///
/// A warm-cache pass registers the fetch up front (skipping local files,
/// which need a blocking-friendly context); a background driver then awaits
/// the task. On failure the driver consults `should_retry(failure_count,
/// last_error)`; while it returns true, a fresh fetch replaces the stale
/// failure in the registry and the load repeats. The first `false` makes
/// the failure terminal. Must be called inside a tokio runtime.
pub fn load_composition(
    factory: Arc<CompositionFactory>,
    spec: CompositionSpec,
    cache_key: Option<String>,
    mut should_retry: impl FnMut(u32, &LoadError) -> bool + Send + 'static,
) -> CompositionResult {
    let result = CompositionResult::new();

    let _ = factory.warm(&spec, cache_key.as_deref());

    let adapter = result.clone();
    tokio::spawn(async move {
        let mut failures: u32 = 0;
        loop {
            let task = if failures == 0 {
                factory.task_for(&spec, cache_key.as_deref())
            } else {
                debug!("retrying {} (failure {})", spec, failures);
                factory.reload(&spec, cache_key.as_deref())
            };

            match task.join().await {
                Ok(path) => {
                    adapter.task.complete(path);
                    return;
                }
                Err(error) => {
                    failures += 1;
                    if !should_retry(failures, &error) {
                        adapter.task.complete_err_shared(error);
                        return;
                    }
                }
            }
        }
    });

    result
}
