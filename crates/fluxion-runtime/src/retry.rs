use fluxion_core::FluxionError;
use std::future::Future;
use tokio::time::Duration;
use tracing::warn;

/// Bounded, backed-off retry budget for a fallible unit of work.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

/// Transient failures are upstream-overload conditions that are likely to
/// succeed on retry; everything else is fatal and propagates immediately.
fn is_transient(e: &FluxionError) -> bool {
    let msg = e.to_string();
    msg.contains("503") || msg.contains("overloaded")
}

/// Run `op` up to the policy's attempt budget, doubling the delay between
/// transient failures. The wait is a cooperative suspension of the calling
/// task only; concurrent runs keep being served.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, FluxionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FluxionError>>,
{
    let mut delay_ms = policy.initial_delay_ms;
    let mut last_err = None;
    for attempt in 1..=policy.retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) => {
                if attempt < policy.retries {
                    warn!(
                        attempt,
                        retries = policy.retries,
                        delay_ms,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms *= 2;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    let last = last_err.map(|e| e.to_string()).unwrap_or_default();
    Err(FluxionError::RetriesExhausted(last))
}
