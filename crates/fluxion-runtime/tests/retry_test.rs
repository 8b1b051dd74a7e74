use fluxion_core::FluxionError;
use fluxion_runtime::{run_with_retry, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::{Duration, Instant};

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_with_doubling_backoff() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::default();
    let started = Instant::now();

    let result = run_with_retry(&policy, || {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(FluxionError::Llm("upstream returned 503".into()))
            } else {
                Ok(41 + 1)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // 1000ms after the first failure, 2000ms after the second
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn fatal_errors_abort_after_one_attempt() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::default();
    let started = Instant::now();

    let result: Result<(), _> = run_with_retry(&policy, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(FluxionError::Llm("bad prompt".into())) }
    })
    .await;

    assert!(matches!(result, Err(FluxionError::Llm(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_surfaces_last_transient_error() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::default();

    let result: Result<(), _> = run_with_retry(&policy, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(FluxionError::Llm("model is overloaded".into())) }
    })
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, FluxionError::RetriesExhausted(_)));
    assert!(err.to_string().contains("overloaded"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn custom_budget_is_honored() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy {
        retries: 5,
        initial_delay_ms: 10,
    };

    let result: Result<(), _> = run_with_retry(&policy, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(FluxionError::Http("503 Service Unavailable".into())) }
    })
    .await;

    assert!(matches!(result, Err(FluxionError::RetriesExhausted(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn immediate_success_never_sleeps() {
    let policy = RetryPolicy::default();
    let result = run_with_retry(&policy, || async { Ok::<_, FluxionError>("done") }).await;
    assert_eq!(result.unwrap(), "done");
}
