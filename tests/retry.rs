use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use gust::error::GustError;
use gust::retry::{RetryPolicy, with_retry};

fn retryable() -> GustError {
    GustError::Upstream {
        provider: "test".to_string(),
        message: "boom".to_string(),
        status: Some(503),
    }
}

fn non_retryable() -> GustError {
    GustError::Upstream {
        provider: "test".to_string(),
        message: "bad request".to_string(),
        status: Some(400),
    }
}

#[test]
fn backoff_doubles_from_base_and_caps() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff(0), Duration::from_secs(4));
    assert_eq!(policy.backoff(1), Duration::from_secs(8));
    assert_eq!(policy.backoff(2), Duration::from_secs(10));
    assert_eq!(policy.backoff(9), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn two_failures_then_success_returns_ok() {
    let calls = AtomicU32::new(0);
    let result = with_retry(RetryPolicy::default(), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(retryable())
            } else {
                Ok("done".to_string())
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn three_failures_exhaust_attempts_and_propagate_final_error() {
    let calls = AtomicU32::new(0);
    let result: Result<String, _> = with_retry(RetryPolicy::default(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(retryable()) }
    })
    .await;
    assert!(matches!(
        result.unwrap_err(),
        GustError::Upstream { status: Some(503), .. }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_short_circuits() {
    let calls = AtomicU32::new(0);
    let result: Result<String, _> = with_retry(RetryPolicy::default(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(non_retryable()) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn backoff_waits_are_sequential_between_attempts() {
    let start = tokio::time::Instant::now();
    let _: Result<String, _> = with_retry(RetryPolicy::default(), || async { Err(retryable()) }).await;
    // Two sleeps between three attempts: 4s + 8s
    assert_eq!(start.elapsed(), Duration::from_secs(12));
}

#[test]
fn retryability_classification() {
    assert!(retryable().is_retryable());
    assert!(!non_retryable().is_retryable());
    assert!(
        GustError::RateLimited {
            provider: "azure".to_string()
        }
        .is_retryable()
    );
    assert!(
        !GustError::ModelNotFound {
            model: "gpt-5".to_string()
        }
        .is_retryable()
    );
    assert!(
        !GustError::Formatting {
            field: "topic".to_string()
        }
        .is_retryable()
    );
}
