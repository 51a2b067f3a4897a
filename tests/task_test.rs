use std::sync::Arc;
use std::time::Duration;

use anim_cache_engine::engine::task::Task;
use anim_cache_engine::LoadError;

#[tokio::test]
async fn test_join_multiple_waiters_observe_same_value() {
    let task: Arc<Task<u32>> = Arc::new(Task::pending());

    let mut waiters = Vec::new();
    for _ in 0..4 {
        let task = Arc::clone(&task);
        waiters.push(tokio::spawn(async move { task.join().await }));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(task.is_pending());
    task.complete(9);

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap(), 9);
    }
}

#[tokio::test]
async fn test_join_after_completion_returns_known_result() {
    let task: Task<u32> = Task::completed(3);
    assert_eq!(task.join().await.unwrap(), 3);

    let failed: Task<u32> = Task::failed(LoadError::transfer("boom"));
    let err = failed.join().await.unwrap_err();
    assert!(err.is_transfer());
}

#[tokio::test]
async fn test_terminal_state_is_fixed_after_first_completion() {
    let task: Task<u32> = Task::pending();
    task.complete_err(LoadError::transfer("first"));
    task.complete(42);
    task.complete_err(LoadError::resolution("second"));

    assert!(task.value().is_none());
    let err = task.error().unwrap();
    assert!(err.is_transfer());
    assert!(err.to_string().contains("first"));
}

#[tokio::test]
async fn test_wait_inside_runtime_is_consumer_misuse() {
    let task: Task<u32> = Task::completed(1);
    let err = task.wait().unwrap_err();
    assert!(err.is_consumer_misuse());
}

#[test]
fn test_wait_on_worker_thread_blocks_until_completion() {
    let task: Arc<Task<u32>> = Arc::new(Task::pending());

    let completer = {
        let task = Arc::clone(&task);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            task.complete(5);
        })
    };

    assert_eq!(task.wait().unwrap(), 5);
    completer.join().unwrap();
}

#[tokio::test]
async fn test_cancel_does_not_uncomplete() {
    let task: Task<u32> = Task::completed(8);
    task.cancel();
    assert!(task.is_cancelled());
    assert_eq!(task.value(), Some(8));
}
