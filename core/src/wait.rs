//! State-change polling for asynchronous AWS operations.
//!
//! Many AWS mutations return before the resource reaches its final state.
//! [`StateChangeConf`] repeatedly invokes a status lookup until the observed
//! status is one of the target statuses, the lookup fails, or the time
//! budget runs out.
//!
//! ```ignore
//! let stream = StateChangeConf::new(&["CREATING"], &["ACTIVE"], Duration::from_secs(300))
//!     .delay(Duration::from_secs(10))
//!     .min_timeout(Duration::from_secs(3))
//!     .wait_for_state(&arn, || stream_status(api, &arn))
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::retry::WholeMillis;

const MIN_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;
/// Budgets beyond this are treated as unbounded, so the deadline always fits in an `Instant`.
const MAX_BUDGET: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// One successful status lookup: the remote object and its status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed<T> {
    pub object: T,
    pub status: String,
}

impl<T> Observed<T> {
    pub fn new(object: T, status: impl Into<String>) -> Self {
        Self {
            object,
            status: status.into(),
        }
    }
}

/// What to do with a status that is in neither the pending nor the target set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownStatus {
    Ignore,
    /// Log a warning and keep polling.
    #[default]
    Warn,
    Fail,
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error(
        "timeout while waiting for state to become '{}' (last state: '{}', timeout: {:?}, {} lookups)",
        join_statuses(.target),
        last_or_none(.last_status),
        .timeout,
        .attempts
    )]
    Timeout {
        timeout:     Duration,
        last_status: Option<String>,
        target:      Vec<String>,
        attempts:    u32,
    },
    #[error(transparent)]
    Refresh(anyhow::Error),
    #[error("resource not found after {checks} consecutive lookups")]
    NotFound { checks: u32 },
    #[error("unexpected state '{status}', wanted target '{}'", join_statuses(.target))]
    UnexpectedStatus { status: String, target: Vec<String> },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

fn join_statuses(statuses: &[String]) -> String {
    statuses.join(", ")
}

fn last_or_none(status: &Option<String>) -> &str {
    status.as_deref().unwrap_or("<none>")
}

#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pub pending: Vec<String>,
    pub target:  Vec<String>,
    /// Total wall-clock budget, including `delay`.
    pub timeout: Duration,
    pub delay:   Duration,
    /// Fixed spacing between lookups. When unset, lookups back off
    /// geometrically starting from `min_timeout`.
    pub poll_interval: Option<Duration>,
    pub min_timeout:   Duration,
    pub not_found_checks: u32,
    pub continuous_target_occurrence: u32,
    pub unknown_status: UnknownStatus,
}

impl StateChangeConf {
    pub fn new(pending: &[&str], target: &[&str], timeout: Duration) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout,
            delay: Duration::ZERO,
            poll_interval: None,
            min_timeout: Duration::ZERO,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurrence: 1,
            unknown_status: UnknownStatus::default(),
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn continuous_target_occurrence(mut self, occurrences: u32) -> Self {
        self.continuous_target_occurrence = occurrences.max(1);
        self
    }

    pub fn unknown_status(mut self, policy: UnknownStatus) -> Self {
        self.unknown_status = policy;
        self
    }

    /// Delays between lookups: the fixed `poll_interval` when set, otherwise
    /// doubling from `min_timeout` (at least 100ms) up to `max(min_timeout, 10s)`.
    fn backoff(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        match self.poll_interval {
            Some(interval) => Box::new(std::iter::repeat(interval)),
            None => Box::new(
                WholeMillis(
                    ExponentialBuilder::default()
                        .with_min_delay(self.min_timeout.max(MIN_BACKOFF))
                        .with_max_delay(self.min_timeout.max(MAX_BACKOFF))
                        .with_factor(2.0)
                        .without_max_times(),
                )
                .build(),
            ),
        }
    }

    fn timeout_error(&self, last_status: Option<String>, attempts: u32) -> WaitError {
        WaitError::Timeout {
            timeout: self.timeout,
            last_status,
            target: self.target.clone(),
            attempts,
        }
    }

    /// Polls `lookup` until it reports a target status and returns the object
    /// from that observation.
    ///
    /// `lookup` returns `Ok(None)` when the describe call found nothing. A
    /// lookup error ends the wait immediately and is never retried.
    pub async fn wait_for_state<T, F, Fut>(&self, resource: &str, mut lookup: F) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<Observed<T>>>>,
    {
        let deadline = Instant::now() + self.timeout.min(MAX_BUDGET);

        if !self.delay.is_zero() {
            tokio::time::sleep_until(deadline.min(Instant::now() + self.delay.min(MAX_BUDGET))).await;
        }

        let mut attempts = 0u32;
        let mut not_found_ticks = 0u32;
        let mut target_occurrences = 0u32;
        let mut last_status: Option<String> = None;
        let mut delays = self.backoff();

        loop {
            if Instant::now() >= deadline {
                warn!(resource, attempts, last_status = ?last_status, "Timed out waiting for state change");
                return Err(self.timeout_error(last_status, attempts));
            }

            attempts += 1;
            let result = match tokio::time::timeout_at(deadline, lookup()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(resource, attempts, "Status lookup still running at deadline");
                    return Err(self.timeout_error(last_status, attempts));
                }
            };

            match result {
                Err(e) => return Err(WaitError::Refresh(e)),
                Ok(None) => {
                    not_found_ticks += 1;
                    target_occurrences = 0;
                    if not_found_ticks > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            checks: not_found_ticks,
                        });
                    }
                    debug!(resource, attempt = attempts, "Resource not found yet");
                }
                Ok(Some(observed)) => {
                    not_found_ticks = 0;
                    last_status = Some(observed.status.clone());

                    if self.target.contains(&observed.status) {
                        target_occurrences += 1;
                        if target_occurrences >= self.continuous_target_occurrence {
                            debug!(resource, status = %observed.status, attempts, "Reached target state");
                            return Ok(observed.object);
                        }
                    } else {
                        target_occurrences = 0;
                        if !self.pending.contains(&observed.status) {
                            match self.unknown_status {
                                UnknownStatus::Ignore => {}
                                UnknownStatus::Warn => {
                                    warn!(resource, status = %observed.status, "Unexpected state while waiting, still polling")
                                }
                                UnknownStatus::Fail => {
                                    return Err(WaitError::UnexpectedStatus {
                                        status: observed.status,
                                        target: self.target.clone(),
                                    });
                                }
                            }
                        } else {
                            debug!(resource, status = %observed.status, attempt = attempts, "Still pending");
                        }
                    }
                }
            }

            let backoff = delays.next().unwrap_or(MAX_BACKOFF);
            tokio::time::sleep_until(deadline.min(Instant::now() + backoff)).await;
        }
    }
}
