// Single-completion asynchronous result. A task is completed exactly once,
// from any thread, and can be observed through listeners, a cooperative
// suspend, or a blocking wait — before or after completion.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{LoadError, SharedError};

/// Outcome of a task, shared by every observer.
pub type TaskResult<T> = Result<T, SharedError>;

/// The task type produced by the factory: resolves to a cached file path.
pub type FileTask = Task<PathBuf>;

type SuccessListener<T> = Box<dyn FnOnce(&T) + Send>;
type FailureListener = Box<dyn FnOnce(&SharedError) + Send>;

enum State<T> {
    Pending {
        on_success: Vec<SuccessListener<T>>,
        on_failure: Vec<FailureListener>,
    },
    Done(TaskResult<T>),
}

/// A fetch-in-progress or fetch-result.
///
/// Terminal state is set at most once; a second completion attempt is a
/// no-op. Listeners registered before completion fire exactly once, in
/// registration order, on the completing thread. Listeners registered after
/// completion fire immediately with the already-known outcome.
pub struct Task<T> {
    state: Mutex<State<T>>,
    cancel: CancellationToken,
}

impl<T: Clone + Send + 'static> Task<T> {
    /// A task with no result yet.
    pub fn pending() -> Self {
        Self {
            state: Mutex::new(State::Pending {
                on_success: Vec::new(),
                on_failure: Vec::new(),
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// A task that already succeeded, e.g. synthesized from a disk cache hit.
    pub fn completed(value: T) -> Self {
        Self {
            state: Mutex::new(State::Done(Ok(value))),
            cancel: CancellationToken::new(),
        }
    }

    /// A task that already failed.
    pub fn failed(error: LoadError) -> Self {
        Self {
            state: Mutex::new(State::Done(Err(Arc::new(error)))),
            cancel: CancellationToken::new(),
        }
    }

    /// Complete the task with a value. Ignored if already terminal.
    pub fn complete(&self, value: T) {
        let fired = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Done(Ok(value.clone()))) {
                State::Pending { on_success, .. } => Some(on_success),
                done @ State::Done(_) => {
                    // Already terminal: restore the original outcome.
                    *state = done;
                    None
                }
            }
        };
        // Listeners run outside the lock so they may register new listeners.
        if let Some(listeners) = fired {
            for listener in listeners {
                listener(&value);
            }
        }
    }

    /// Complete the task with an error. Ignored if already terminal.
    pub fn complete_err(&self, error: LoadError) {
        self.complete_err_shared(Arc::new(error));
    }

    /// Complete the task with an error that is already shared, e.g. one
    /// observed from another task. Ignored if already terminal.
    pub fn complete_err_shared(&self, error: SharedError) {
        let fired = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Done(Err(Arc::clone(&error)))) {
                State::Pending { on_failure, .. } => Some(on_failure),
                done @ State::Done(_) => {
                    *state = done;
                    None
                }
            }
        };
        if let Some(listeners) = fired {
            if listeners.is_empty() {
                warn!("task failed but no failure listener was added: {}", error);
            }
            for listener in listeners {
                listener(&error);
            }
        }
    }

    /// Register a success listener. Fires immediately if the task already
    /// succeeded; never fires if it failed. Chainable.
    pub fn on_success(&self, listener: impl FnOnce(&T) + Send + 'static) -> &Self {
        let mut pending = Some(Box::new(listener) as SuccessListener<T>);
        let immediate = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { on_success, .. } => {
                    on_success.push(pending.take().unwrap());
                    None
                }
                State::Done(Ok(value)) => Some(value.clone()),
                State::Done(Err(_)) => None,
            }
        };
        if let (Some(value), Some(listener)) = (immediate, pending.take()) {
            listener(&value);
        }
        self
    }

    /// Register a failure listener. Fires immediately if the task already
    /// failed; never fires if it succeeded. Chainable.
    pub fn on_failure(&self, listener: impl FnOnce(&SharedError) + Send + 'static) -> &Self {
        let mut pending = Some(Box::new(listener) as FailureListener);
        let immediate = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { on_failure, .. } => {
                    on_failure.push(pending.take().unwrap());
                    None
                }
                State::Done(Err(error)) => Some(Arc::clone(error)),
                State::Done(Ok(_)) => None,
            }
        };
        if let (Some(error), Some(listener)) = (immediate, pending.take()) {
            listener(&error);
        }
        self
    }

    /// The success value, if the task has succeeded.
    pub fn value(&self) -> Option<T> {
        match &*self.state.lock() {
            State::Done(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// The error, if the task has failed.
    pub fn error(&self) -> Option<SharedError> {
        match &*self.state.lock() {
            State::Done(Err(error)) => Some(Arc::clone(error)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(&*self.state.lock(), State::Done(_))
    }

    pub fn is_pending(&self) -> bool {
        !self.is_complete()
    }

    /// Suspend until the task reaches a terminal state. Cooperative: does
    /// not block the executor. Safe to call from any number of observers.
    pub async fn join(&self) -> TaskResult<T> {
        let (tx, rx) = tokio::sync::oneshot::channel::<TaskResult<T>>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let tx_failure = Arc::clone(&tx);
        self.on_success(move |value| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(Ok(value.clone()));
            }
        })
        .on_failure(move |error| {
            if let Some(tx) = tx_failure.lock().take() {
                let _ = tx.send(Err(Arc::clone(error)));
            }
        });

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Arc::new(LoadError::resolution(
                "task abandoned before completion",
            ))),
        }
    }

    /// Block the current OS thread until the task reaches a terminal state.
    ///
    /// Only for dedicated worker threads. Returns `ConsumerMisuse` when
    /// invoked from inside the async runtime, where blocking would stall the
    /// cooperative scheduler — use [`Task::join`] there instead.
    pub fn wait(&self) -> TaskResult<T> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Arc::new(LoadError::consumer_misuse(
                "Task::wait() called from inside the async runtime; use join().await",
            )));
        }

        let (tx, rx) = std::sync::mpsc::sync_channel::<TaskResult<T>>(1);
        let tx_failure = tx.clone();
        self.on_success(move |value| {
            let _ = tx.send(Ok(value.clone()));
        })
        .on_failure(move |error| {
            let _ = tx_failure.send(Err(Arc::clone(error)));
        });

        rx.recv().unwrap_or_else(|_| {
            Err(Arc::new(LoadError::resolution(
                "task abandoned before completion",
            )))
        })
    }

    /// Advisory cancellation: asks the in-flight fetch to stop. Does not
    /// un-complete the task for other holders.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when [`Task::cancel`] is called. Used by the fetch future to
    /// exit early.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}

impl<T: Clone + Send + 'static> Default for Task<T> {
    fn default() -> Self {
        Self::pending()
    }
}
