//! Retry policy: which failures repeat, and how long to wait.

use crate::types::ClientConfig;
use rand::Rng;
use std::time::Duration;
use walkup_core::WalkupError;

/// Exponential backoff with jitter.
///
/// `base_delay * 2^attempt + jitter`, capped at `max_delay`. A 429 with a
/// `Retry-After` header overrides the formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            max_jitter: config.max_jitter(),
        }
    }

    /// Backoff before retry number `attempt + 1`, without jitter.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        (self.base_backoff(attempt) + jitter).min(self.max_delay)
    }

    /// Delay before repeating a request that failed with `error`.
    ///
    /// `None` when the failure is terminal or the retries are spent.
    pub fn delay_for(&self, error: &WalkupError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        match error {
            WalkupError::RateLimited {
                retry_after: Some(wait),
            } => Some(*wait),
            e if e.is_retryable() => Some(self.backoff(attempt)),
            _ => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
