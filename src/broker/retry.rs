//! Bounded retry of broker connect signals.
//!
//! Retries are driven by answers, not by time: each empty answer buys one
//! more connect signal until the budget is spent.

/// Additional connect attempts after the first (6 emissions in total).
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Retry budget and the call counter it is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            attempts: 0,
        }
    }

    /// Create a policy that gives up after the first empty answer.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Count one emission and return its 1-based attempt number.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another emission fits in the budget.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts()
    }

    pub fn is_exhausted(&self) -> bool {
        !self.can_retry()
    }
}
