//! Bounded retry around a single mutating call.
//!
//! Used where AWS is known to reject a valid request for a while after a
//! related change (IAM principals that have not propagated yet, a bucket
//! that was created moments ago). Only errors the caller marks as
//! retryable are retried.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder, Retryable};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total sleep budget. No retry is scheduled once the next delay would pass it.
    pub timeout:       Duration,
    pub initial_delay: Duration,
    pub max_delay:     Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout:       Duration::from_secs(120),
            initial_delay: Duration::from_millis(500),
            max_delay:     Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    fn backoff(&self) -> WholeMillis {
        WholeMillis(
            ExponentialBuilder::default()
                .with_min_delay(self.initial_delay)
                .with_max_delay(self.max_delay)
                .with_factor(2.0)
                .with_total_delay(Some(self.timeout))
                .without_max_times(),
        )
    }
}

/// An exponential schedule with every delay rounded to whole milliseconds.
/// backon scales delays in `f32`, which leaves nanosecond residue.
#[derive(Clone, Debug)]
pub(crate) struct WholeMillis(pub ExponentialBuilder);

impl BackoffBuilder for WholeMillis {
    type Backoff = std::iter::Map<ExponentialBackoff, fn(Duration) -> Duration>;

    fn build(self) -> Self::Backoff {
        self.0.build().map(whole_millis as fn(Duration) -> Duration)
    }
}

fn whole_millis(d: Duration) -> Duration {
    Duration::from_millis((d.as_secs_f64() * 1000.0).round() as u64)
}

/// Runs `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or the time budget runs out. In the last case the most recent
/// error is returned with context naming the operation.
pub async fn retry_when<F, Fut, T, E, R>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
    is_retryable: R,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
    R: Fn(&E) -> bool,
{
    let mut attempt = 1u32;

    let result = operation
        .retry(config.backoff())
        .when(|e| is_retryable(e))
        .notify(|e, delay| {
            warn!(
                operation = %operation_name,
                attempt = attempt,
                error = %e,
                delay_ms = delay.as_millis(),
                "Operation failed with a retryable error, retrying"
            );
            attempt += 1;
        })
        .await;

    match result {
        Ok(result) => Ok(result),
        Err(e) if is_retryable(&e) => Err(e).with_context(|| {
            format!(
                "{} still failing after {} attempts over {:?}",
                operation_name, attempt, config.timeout
            )
        }),
        Err(e) => Err(e.into()),
    }
}
