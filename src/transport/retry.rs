//! Retry policy for failed attempts.

use std::time::Duration;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Resolve the call with the failure.
    Stop,
    /// Retry immediately.
    RetryNow,
    /// Retry after waiting for the given duration.
    RetryAfter(Duration),
}

impl RetryDecision {
    /// Returns true for either retry outcome.
    #[must_use]
    pub const fn is_retry(self) -> bool {
        !matches!(self, Self::Stop)
    }
}

/// Bounded, fixed-delay retry policy.
///
/// `limit` counts retries, not attempts: a limit of 2 allows up to three
/// transmissions of the same call.
///
/// # Example
///
/// ```
/// use netlayer::transport::{RetryDecision, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_limit(2)
///     .with_delay(Duration::from_millis(250));
///
/// let status = Some(http::StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(
///     policy.decide(0, status),
///     RetryDecision::RetryAfter(Duration::from_millis(250))
/// );
/// assert_eq!(policy.decide(2, status), RetryDecision::Stop);
/// assert_eq!(policy.decide(0, None), RetryDecision::Stop);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub limit: u32,

    /// Fixed wait before each retry.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Default retry limit.
    pub const DEFAULT_LIMIT: u32 = 2;

    /// Default delay between attempts (1 second).
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Creates a policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            limit: 0,
            delay: Duration::ZERO,
        }
    }

    /// Sets the retry limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the delay before each retry.
    ///
    /// Zero makes the policy answer [`RetryDecision::RetryNow`].
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns true once `attempt_count` retries have used up the limit.
    #[must_use]
    pub const fn is_exhausted(&self, attempt_count: u32) -> bool {
        attempt_count >= self.limit
    }

    /// Decides the next step after a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `attempt_count` - retries already made for this call (0 after the first failure)
    /// * `status` - HTTP status of the failed attempt, `None` for connection-level failures
    #[must_use]
    #[allow(clippy::match_same_arms)] // 401 keeps its own arm as the refresh seam
    pub fn decide(&self, attempt_count: u32, status: Option<http::StatusCode>) -> RetryDecision {
        if self.is_exhausted(attempt_count) {
            return RetryDecision::Stop;
        }

        let Some(status) = status else {
            return RetryDecision::Stop;
        };

        match status {
            // Hook for refresh-then-retry; the adapter re-reads the token
            // source on the next attempt.
            http::StatusCode::UNAUTHORIZED => self.fixed_delay(),
            _ => self.fixed_delay(),
        }
    }

    const fn fixed_delay(&self) -> RetryDecision {
        if self.delay.is_zero() {
            RetryDecision::RetryNow
        } else {
            RetryDecision::RetryAfter(self.delay)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
