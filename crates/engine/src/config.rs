use std::time::Duration;

use crate::retry::RetryStrategy;

/// Tuning for the action executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum provider calls in flight at once. A rate-limit courtesy to
    /// the platform, not a correctness requirement.
    pub max_concurrent: usize,
    /// Maximum retries after the first attempt of each action.
    pub max_retries: u32,
    /// Timeout applied to every individual attempt.
    pub attempt_timeout: Duration,
    /// Backoff curve between retries.
    pub retry_strategy: RetryStrategy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            max_retries: 3,
            attempt_timeout: Duration::from_secs(30),
            retry_strategy: RetryStrategy::default(),
        }
    }
}

impl ExecutorConfig {
    /// Set the concurrency bound.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Set the backoff curve.
    #[must_use]
    pub fn with_retry_strategy(mut self, retry_strategy: RetryStrategy) -> Self {
        self.retry_strategy = retry_strategy;
        self
    }
}
