//! Tests for the tap combinators (synchronous and asynchronous side effects).

use monadic_tasks::task::{TaskError, TaskMonad};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[rstest]
#[tokio::test]
async fn test_perform_side_effect_executes_action_without_changing_value() {
    let side_effect_called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&side_effect_called);

    let monad = TaskMonad::unit(5).perform_side_effect(move |value| {
        flag.store(true, Ordering::SeqCst);
        assert_eq!(*value, 5);
    });

    let result = monad.get_result().await;

    assert_eq!(result.unwrap(), 5);
    assert!(side_effect_called.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test]
async fn test_perform_side_effect_async_executes_action_without_changing_value() {
    let side_effect_called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&side_effect_called);

    let monad = TaskMonad::unit(10).perform_side_effect_async(move |value| {
        let flag = Arc::clone(&flag);
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
            assert_eq!(value, 10);
            Ok::<_, TaskError>(())
        }
    });

    let result = monad.get_result().await;

    assert_eq!(result.unwrap(), 10);
    assert!(side_effect_called.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test]
async fn test_async_effect_completes_before_value_is_yielded() {
    let finished = Arc::new(AtomicBool::new(false));
    let effect_flag = Arc::clone(&finished);
    let map_flag = Arc::clone(&finished);

    let monad = TaskMonad::unit(1)
        .perform_side_effect_async(move |_| {
            let flag = Arc::clone(&effect_flag);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            }
        })
        .map(move |x| {
            assert!(map_flag.load(Ordering::SeqCst));
            x
        });

    assert_eq!(monad.get_result().await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_async_effect_failure_supersedes_value() {
    let monad = TaskMonad::unit(10).perform_side_effect_async(|_| async { Err("notification failed") });

    let error = monad.get_result().await.unwrap_err();

    assert_eq!(error.to_string(), "notification failed");
}

#[rstest]
#[tokio::test]
async fn test_try_perform_side_effect_failure_supersedes_value() {
    let monad = TaskMonad::unit(3).try_perform_side_effect(|value| {
        if *value > 2 {
            Err(format!("{value} exceeds the limit"))
        } else {
            Ok(())
        }
    });

    let error = monad.get_result().await.unwrap_err();

    assert_eq!(error.to_string(), "3 exceeds the limit");
}

#[rstest]
#[tokio::test]
async fn test_effect_not_invoked_when_source_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sync_calls = Arc::clone(&calls);
    let async_calls = Arc::clone(&calls);

    let monad = TaskMonad::<i32>::fail("source failed")
        .perform_side_effect(move |_| {
            sync_calls.fetch_add(1, Ordering::SeqCst);
        })
        .perform_side_effect_async(move |_| {
            let calls = Arc::clone(&async_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            }
        });

    let error = monad.get_result().await.unwrap_err();

    assert_eq!(error.to_string(), "source failed");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_effect_refires_on_each_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);

    let monad = TaskMonad::unit("event".to_string()).perform_side_effect_async(move |_| {
        let calls = Arc::clone(&calls_clone);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TaskError>(())
        }
    });

    monad.get_result().await.unwrap();
    monad.get_result().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn test_panicking_async_effect_becomes_failure() {
    async fn explode(_: i32) -> Result<(), TaskError> {
        panic!("effect exploded")
    }

    let monad = TaskMonad::unit(1).perform_side_effect_async(explode);

    let error = monad.get_result().await.unwrap_err();

    assert!(error.is_panic());
    assert_eq!(error.to_string(), "callback panicked: effect exploded");
}

#[rstest]
#[tokio::test]
async fn test_panicking_sync_effect_becomes_failure() {
    let monad = TaskMonad::unit(1).perform_side_effect(|_| panic!("effect exploded"));

    let error = monad.get_result().await.unwrap_err();

    assert_eq!(error.to_string(), "callback panicked: effect exploded");
}
