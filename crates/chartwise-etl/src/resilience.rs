//! Resilience primitives for catalog access.

use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::sleep;

/// Per-client rate limiter.
///
/// Limits throughput to a configurable number of requests per second by
/// combining a single-permit [`Semaphore`] with a fixed sleep interval.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a new `RateLimiter` that allows at most
    /// `requests_per_second` requests per second.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            interval: Duration::from_millis(1000 / u64::from(requests_per_second.max(1))),
        }
    }

    /// Waits until a request slot is available, then holds the slot for
    /// the configured interval to enforce the rate limit.
    pub async fn acquire(&self) {
        // The semaphore is never closed; a closed one would mean no limiting.
        let Ok(_permit) = self.semaphore.acquire().await else {
            return;
        };
        sleep(self.interval).await;
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// How often and how patiently a failing catalog call is retried.
///
/// `max_attempts` counts every call including the first. Between attempts
/// the delay starts at `min_delay_ms` and grows by `factor` up to
/// `max_delay_ms`, optionally with random jitter added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: f32,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_delay_ms: 500,
            max_delay_ms: 30_000,
            factor: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries up to `max_attempts` calls with no delay.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_delay_ms: 0,
            max_delay_ms: 0,
            factor: 1.0,
            jitter: false,
        }
    }

    /// Total number of calls allowed, never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// The backoff schedule as a `backon` builder.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms.max(self.min_delay_ms)))
            .with_factor(self.factor)
            .with_max_times((self.attempts() - 1) as usize);

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    /// The delays slept between successive attempts.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.backoff().build().collect()
    }
}
