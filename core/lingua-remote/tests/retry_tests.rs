use lingua_remote::{RemoteError, RetryConfig, retry};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn retries_transient_failures_until_success() {
    let calls = AtomicU32::new(0);
    let value = assert_ok!(
        retry("flaky", &RetryConfig::testing(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(RemoteError::Api {
                    status: 500,
                    message: "boom".into(),
                })
            } else {
                Ok(7)
            }
        })
        .await
    );
    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn stops_at_max_attempts() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = retry("down", &RetryConfig::testing(), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::RateLimited { retry_after_secs: 0 })
    })
    .await;
    assert!(result.unwrap_err().is_rate_limited());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn permanent_failures_are_returned_immediately() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = retry("forbidden", &RetryConfig::testing(), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::Api {
            status: 403,
            message: "no".into(),
        })
    })
    .await;
    assert_err!(result);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn backoff_sleeps_between_attempts() {
    let config = RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 1_000,
        max_delay_ms: 10_000,
        factor: 2.0,
    };
    let start = tokio::time::Instant::now();
    let calls = AtomicU32::new(0);
    let _: Result<(), _> = retry("slow", &config, || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::Api {
            status: 503,
            message: "busy".into(),
        })
    })
    .await;
    // 1s after the first failure, 2s after the second.
    assert_eq!(start.elapsed().as_secs(), 3);
}
