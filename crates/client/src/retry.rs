//! Retry with exponential backoff.
//!
//! [`retry`] is transport agnostic: it runs an operation, asks a predicate
//! whether the outcome is worth another attempt, and sleeps through an
//! injected [`Sleeper`] in between. Delays for retry `n` (1-based) are
//! `initial_delay * 2^(n-1)`, capped at `max_delay`.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Total attempts including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

// =============================================================================
// Sleepers
// =============================================================================

/// Source of backoff delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

/// Returns immediately and records every requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        futures::future::ready(()).boxed()
    }
}

// =============================================================================
// retry
// =============================================================================

/// Run `operation` until `should_retry` rejects its outcome or the policy's
/// retries are used up, and return the last outcome.
///
/// `operation` receives the 0-based attempt number.
pub async fn retry<T, F, Fut, P>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
    should_retry: P,
) -> T
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let mut attempt = 0;
    loop {
        let outcome = operation(attempt).await;
        if attempt >= policy.max_retries || !should_retry(&outcome) {
            return outcome;
        }

        attempt += 1;
        let delay = policy.delay_for(attempt);
        debug!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Retrying request"
        );
        sleeper.sleep(delay).await;
    }
}
