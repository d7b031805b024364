//! Retry policy with exponential backoff and jitter
//!
//! Applied around request execution for transient backend contention
//! (see [`ClientError::is_retryable`](crate::ClientError::is_retryable)).
//! The backoff wait is an awaited sleep, so a caller's surrounding
//! timeout or cancellation still applies to the whole operation.

use std::time::Duration;

use rand::Rng;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_JITTER_PERCENT: u32 = 25;

// Cap exponent to prevent overflow on pathological retry counts
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Bounded exponential backoff with proportional jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_percent: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_percent: DEFAULT_JITTER_PERCENT,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of additional attempts after the first send
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Jitter as a percentage of the capped delay (0 disables jitter)
    pub fn with_jitter_percent(mut self, percent: u32) -> Self {
        self.jitter_percent = percent.min(100);
        self
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay to wait before retry attempt `n` (1-based).
    ///
    /// Computed as `min(base * 2^n, max)` plus a uniform random jitter
    /// of up to `jitter_percent` of the capped value, in whole
    /// milliseconds.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let base_millis = self.base_delay.as_millis() as u64;
        let max_millis = self.max_delay.as_millis() as u64;

        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let capped = base_millis.saturating_mul(2_u64.saturating_pow(exponent)).min(max_millis);

        let jitter = if self.jitter_percent == 0 {
            0
        } else {
            let span = capped * u64::from(self.jitter_percent) / 100;
            if span == 0 {
                0
            } else {
                rand::thread_rng().gen_range(0..=span)
            }
        };

        Duration::from_millis(capped + jitter)
    }
}
